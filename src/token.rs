//! JWT 解码
//!
//! 只解析载荷段，不做签名校验：解出来的声明只是客户端的展示提示，
//! 真正的权限判断永远在后端。

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token must have 3 segments, found {0}")]
    Segments(usize),
    #[error("token payload is not valid base64url")]
    Base64,
    #[error("token payload is not valid JSON: {0}")]
    Json(String),
    #[error("token expiry `{0}` is out of range")]
    Expiry(i64),
}

/// 令牌载荷中客户端关心的声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_organizer: bool,
    #[serde(default)]
    pub is_staff: bool,
}

impl Claims {
    pub fn expires_at(&self) -> Result<DateTime<Utc>, DecodeError> {
        DateTime::from_timestamp(self.exp, 0).ok_or(DecodeError::Expiry(self.exp))
    }

    /// `exp` 早于当前时间即视为过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}

/// 解码令牌载荷（不校验签名）
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    // 部分编码器会保留 padding
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::Base64)?;

    serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))
}

// =========================================================
// 身份 (Identity)
// =========================================================

/// 角色（由令牌中的两个标志位一次性推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Organizer,
    Staff,
    StaffOrganizer,
}

impl Role {
    pub fn from_flags(is_organizer: bool, is_staff: bool) -> Self {
        match (is_organizer, is_staff) {
            (false, false) => Role::Student,
            (true, false) => Role::Organizer,
            (false, true) => Role::Staff,
            (true, true) => Role::StaffOrganizer,
        }
    }

    pub fn is_organizer(self) -> bool {
        matches!(self, Role::Organizer | Role::StaffOrganizer)
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Staff | Role::StaffOrganizer)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Organizer => "Organizator",
            Role::Staff => "Administrator",
            Role::StaffOrganizer => "Administrator / Organizator",
        }
    }
}

/// 当前会话的身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<u64>,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn from_claims(claims: &Claims) -> Result<Self, DecodeError> {
        let email = claims.email.clone().unwrap_or_default();
        let display_name = claims
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.clone());

        Ok(Self {
            user_id: claims.user_id,
            email,
            display_name,
            role: Role::from_flags(claims.is_organizer, claims.is_staff),
            expires_at: claims.expires_at()?,
        })
    }

    pub fn from_token(token: &str) -> Result<Self, DecodeError> {
        Self::from_claims(&decode_claims(token)?)
    }

    /// 头像上显示的首字母
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

// =========================================================
// 测试工具: 使用真实编码器生成令牌
// =========================================================


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn decodes_minted_token() {
        let exp = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let decoded = decode_claims(&mint(&claims(exp, true, false))).unwrap();

        assert_eq!(decoded.exp, exp.timestamp());
        assert_eq!(decoded.email.as_deref(), Some("ana.pop@student.usv.ro"));
        assert!(decoded.is_organizer);
        assert!(!decoded.is_staff);

        let identity = Identity::from_claims(&decoded).unwrap();
        assert_eq!(identity.role, Role::Organizer);
        assert_eq!(identity.display_name, "Ana Pop");
        assert_eq!(identity.expires_at, exp);
        assert_eq!(identity.initial(), 'A');
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!(decode_claims("abc"), Err(DecodeError::Segments(1)));
        assert_eq!(decode_claims("a.b.c.d"), Err(DecodeError::Segments(4)));
        assert_eq!(decode_claims("a.@@@.c"), Err(DecodeError::Base64));

        let not_json = URL_SAFE_NO_PAD.encode("hello");
        assert!(matches!(
            decode_claims(&format!("h.{not_json}.s")),
            Err(DecodeError::Json(_))
        ));

        let no_exp = URL_SAFE_NO_PAD.encode(r#"{"email":"a@b.c"}"#);
        assert!(matches!(
            decode_claims(&format!("h.{no_exp}.s")),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn missing_flags_default_to_student() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"exp": 1900000000, "email": "x@usv.ro"}"#);
        let claims = decode_claims(&format!("h.{payload}.s")).unwrap();
        let identity = Identity::from_claims(&claims).unwrap();
        assert_eq!(identity.role, Role::Student);
        assert_eq!(identity.display_name, "x@usv.ro");
    }

    #[test]
    fn expiry_is_strict() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let c = claims(now, false, false);
        assert!(!c.is_expired(now));
        assert!(c.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn role_flags() {
        assert!(Role::from_flags(true, true).is_organizer());
        assert!(Role::from_flags(true, true).is_staff());
        assert!(!Role::from_flags(false, true).is_organizer());
        assert!(!Role::Student.is_staff());
    }
}
