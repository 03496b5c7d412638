//! 票据二维码载荷：`UNIEVENT:TICKET:V1:<票据编码>`

use crate::error::{ClientError, ClientResult};
use unievent_shared::QR_PAYLOAD_PREFIX;

/// 已带前缀的编码原样返回
pub fn encode_payload(code: &str) -> String {
    let code = code.trim();
    if code.starts_with(QR_PAYLOAD_PREFIX) {
        code.to_string()
    } else {
        format!("{}{}", QR_PAYLOAD_PREFIX, code)
    }
}

/// 扫描得到的载荷
///
/// 去掉首尾空白后原样提交给后端（包括前缀），由后端解析票据编码；
/// 这里只拦截空文本。
pub fn parse_payload(text: &str) -> ClientResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ClientError::rejected("Cod QR invalid."));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_idempotent() {
        let payload = encode_payload("4f1c2b3a-aaaa-bbbb-cccc-000000000001");
        assert_eq!(payload, "UNIEVENT:TICKET:V1:4f1c2b3a-aaaa-bbbb-cccc-000000000001");
        assert_eq!(encode_payload(&payload), payload);
    }

    #[test]
    fn parse_keeps_the_scanned_text() {
        assert_eq!(
            parse_payload(" UNIEVENT:TICKET:V1:abc-123\n").unwrap(),
            "UNIEVENT:TICKET:V1:abc-123"
        );
        assert_eq!(parse_payload("abc-123").unwrap(), "abc-123");
        assert_eq!(parse_payload("OTHER:abc").unwrap(), "OTHER:abc");
    }

    #[test]
    fn parse_rejects_blank_text() {
        assert!(parse_payload("").is_err());
        assert!(parse_payload(" \n\t").is_err());
    }
}
