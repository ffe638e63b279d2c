use serde::{Deserialize, Serialize};

/// One cloud account registered in the Sources service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub source_type_id: String,
    pub uid: String,
}

/// `{"data": [...]}` list wrapper used by every Sources listing.
#[derive(Debug, Deserialize)]
pub(crate) struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationTypePayload {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SourcePayload {
    pub id: String,
    pub name: String,
    pub source_type_id: String,
    pub uid: String,
}

impl From<SourcePayload> for Source {
    fn from(payload: SourcePayload) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            source_type_id: payload.source_type_id,
            uid: payload.uid,
        }
    }
}

/// Raw credential record as listed by the authentications endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticationRecord {
    pub username: String,
    pub authtype: String,
    pub resource_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_list_ignores_unknown_fields() {
        let body = r#"{
            "meta": {"count": 1},
            "data": [{"id": "1", "name": "aws-prod", "source_type_id": "2", "uid": "u-1", "paused_at": null}]
        }"#;

        let list: DataList<SourcePayload> = serde_json::from_str(body).expect("valid payload");
        let sources: Vec<Source> = list.data.into_iter().map(Source::from).collect();

        assert_eq!(
            sources,
            vec![Source {
                id: String::from("1"),
                name: String::from("aws-prod"),
                source_type_id: String::from("2"),
                uid: String::from("u-1"),
            }]
        );
    }

    #[test]
    fn missing_data_key_is_an_empty_list() {
        let list: DataList<SourcePayload> = serde_json::from_str("{}").expect("valid payload");
        assert!(list.data.is_empty());
    }

    #[test]
    fn partial_source_is_rejected() {
        let body = r#"{"data": [{"id": "1", "name": "aws-prod"}]}"#;
        assert!(serde_json::from_str::<DataList<SourcePayload>>(body).is_err());
    }
}
