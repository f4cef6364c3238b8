//! 凭证接口返回的预签名表单数据
//!
//! 接口返回形如:
//! `{ "resultURL": ..., "formData": { "url": ..., "fields": { ... } } }`
//! 字段值原样透传给对象存储，这里只校验字段存在且为字符串。

use crate::error::UploadError;
use serde::{Deserialize, Serialize};

/// 表单字段在请求体中的顺序，文件部分必须排在它们之后
pub const FIELD_NAMES: [&str; 10] = [
    "acl",
    "Content-Type",
    "Key",
    "bucket",
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Date",
    "X-Amz-Security-Token",
    "Policy",
    "X-Amz-Signature",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsResponse {
    #[serde(rename = "resultURL")]
    pub result_url: String,
    #[serde(rename = "deleteURL", default)]
    pub delete_url: Option<String>,
    #[serde(rename = "formData")]
    pub form_data: FormData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    pub url: String,
    pub fields: PresignedFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedFields {
    pub acl: String,
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    #[serde(rename = "Key")]
    pub key: String,
    pub bucket: String,
    #[serde(rename = "X-Amz-Algorithm")]
    pub algorithm: String,
    #[serde(rename = "X-Amz-Credential")]
    pub credential: String,
    #[serde(rename = "X-Amz-Date")]
    pub date: String,
    #[serde(rename = "X-Amz-Security-Token")]
    pub security_token: String,
    #[serde(rename = "Policy")]
    pub policy: String,
    #[serde(rename = "X-Amz-Signature")]
    pub signature: String,
}

impl PresignedFields {
    /// 按 `FIELD_NAMES` 的顺序返回 (字段名, 值)
    pub fn ordered(&self) -> [(&'static str, &str); 10] {
        [
            (FIELD_NAMES[0], self.acl.as_str()),
            (FIELD_NAMES[1], self.content_type.as_str()),
            (FIELD_NAMES[2], self.key.as_str()),
            (FIELD_NAMES[3], self.bucket.as_str()),
            (FIELD_NAMES[4], self.algorithm.as_str()),
            (FIELD_NAMES[5], self.credential.as_str()),
            (FIELD_NAMES[6], self.date.as_str()),
            (FIELD_NAMES[7], self.security_token.as_str()),
            (FIELD_NAMES[8], self.policy.as_str()),
            (FIELD_NAMES[9], self.signature.as_str()),
        ]
    }
}

impl CredentialsResponse {
    /// 解析凭证响应；缺字段或类型不对直接报错，不会带着空值继续上传
    pub fn parse(body: &str) -> Result<Self, UploadError> {
        serde_json::from_str(body).map_err(|e| UploadError::InvalidCredentials(e.to_string()))
    }

    /// 空字符串的删除链接视为没有
    pub fn delete_url(&self) -> Option<&str> {
        self.delete_url.as_deref().filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_BODY: &str = r#"{"resultURL":"https://cdn.example/img1.png","formData":{"url":"https://s3.example/bucket","fields":{"acl":"public-read","Content-Type":"image/png","Key":"img1.png","bucket":"b","X-Amz-Algorithm":"AWS4-HMAC-SHA256","X-Amz-Credential":"c","X-Amz-Date":"d","X-Amz-Security-Token":"t","Policy":"p","X-Amz-Signature":"s"}}}"#;

    #[test]
    fn parses_sample_response() {
        let creds = CredentialsResponse::parse(SAMPLE_BODY).unwrap();

        assert_eq!(creds.result_url, "https://cdn.example/img1.png");
        assert_eq!(creds.form_data.url, "https://s3.example/bucket");
        assert_eq!(creds.delete_url(), None);

        let fields = creds.form_data.fields.ordered();
        assert_eq!(
            fields,
            [
                ("acl", "public-read"),
                ("Content-Type", "image/png"),
                ("Key", "img1.png"),
                ("bucket", "b"),
                ("X-Amz-Algorithm", "AWS4-HMAC-SHA256"),
                ("X-Amz-Credential", "c"),
                ("X-Amz-Date", "d"),
                ("X-Amz-Security-Token", "t"),
                ("Policy", "p"),
                ("X-Amz-Signature", "s"),
            ]
        );
    }

    #[test]
    fn delete_url_is_optional() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_BODY).unwrap();
        value["deleteURL"] = serde_json::json!("https://cdn.example/delete/img1");
        let creds = CredentialsResponse::parse(&value.to_string()).unwrap();
        assert_eq!(creds.delete_url(), Some("https://cdn.example/delete/img1"));

        value["deleteURL"] = serde_json::json!("");
        let creds = CredentialsResponse::parse(&value.to_string()).unwrap();
        assert_eq!(creds.delete_url(), None);
    }

    #[test]
    fn rejects_each_missing_field() {
        for name in FIELD_NAMES {
            let mut value: serde_json::Value = serde_json::from_str(SAMPLE_BODY).unwrap();
            value["formData"]["fields"]
                .as_object_mut()
                .unwrap()
                .remove(name);

            let err = CredentialsResponse::parse(&value.to_string()).unwrap_err();
            assert!(
                matches!(err, UploadError::InvalidCredentials(ref msg) if msg.contains(name)),
                "缺少 {} 时应报错, 实际: {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn rejects_non_string_field_and_garbage() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_BODY).unwrap();
        value["formData"]["fields"]["Policy"] = serde_json::json!(42);
        assert!(CredentialsResponse::parse(&value.to_string()).is_err());

        assert!(CredentialsResponse::parse("<html>oops</html>").is_err());
        assert!(CredentialsResponse::parse("{}").is_err());
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_BODY).unwrap();
        value["formData"]["fields"]["x-extra"] = serde_json::json!("ignored");
        value["expires"] = serde_json::json!(3600);

        assert!(CredentialsResponse::parse(&value.to_string()).is_ok());
    }
}
