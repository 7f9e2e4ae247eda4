// FIPE API wire types

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Ids arrive as JSON numbers on some endpoints and as numeric strings on others.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => u32::try_from(n).map_err(de::Error::custom),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid id '{s}': {e}"))),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReferenceTableEntry {
    #[serde(rename = "Codigo", deserialize_with = "deserialize_id")]
    pub id: u32,
    #[serde(rename = "Mes")]
    pub month: String,
}

/// `{ "Label": ..., "Value": ... }` pairs used by brands and models.
#[derive(Debug, Deserialize)]
pub(crate) struct LabeledId {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value", deserialize_with = "deserialize_id")]
    pub value: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelsResponse {
    #[serde(rename = "Modelos", default)]
    pub models: Vec<LabeledId>,
}

/// Year entries keep their code as text: `"2024-1"`.
#[derive(Debug, Deserialize)]
pub(crate) struct YearEntry {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceRecord {
    #[serde(rename = "Valor")]
    pub price: String,
    #[serde(rename = "CodigoFipe")]
    pub fipe_code: String,
    #[serde(rename = "Combustivel")]
    pub fuel: String,
}

/// The price endpoint answers `200 OK` with `{ "codigo": "0", "erro": ... }` on bad input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PriceResponse {
    Price(PriceRecord),
    Error {
        #[serde(rename = "erro")]
        message: String,
    },
}
