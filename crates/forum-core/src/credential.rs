//! 비밀번호 해싱 및 확인 키 유틸리티.
//!
//! 저장되는 비밀번호는 항상 `hashed-` 마커 뒤에 SHA-256 16진수 다이제스트가
//! 붙은 형식입니다. 평문은 저장하거나 비교하지 않습니다.

use sha2::{Digest, Sha256};

use crate::error::{ForumError, ForumResult};

/// 해시된 값 앞에 붙는 마커.
pub const HASH_MARKER: &str = "hashed-";

/// 비밀번호 최소 길이 (문자 수).
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// SHA-256 16진수 다이제스트.
fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// 값이 이미 해시되었는지 확인.
///
/// 마커 뒤에 64자리 소문자 16진수 다이제스트가 있어야 합니다.
pub fn is_hashed(value: &str) -> bool {
    value.strip_prefix(HASH_MARKER).is_some_and(|digest| {
        digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// 비밀번호 길이 검증.
///
/// 해싱보다 먼저 실행되어야 합니다.
pub fn validate_password(value: &str) -> ForumResult<()> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ForumError::Validation(format!(
            "Password length must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

/// 비밀번호 해싱.
///
/// 이미 해시된 값은 그대로 반환하므로 생성/수정 양쪽에서 호출해도
/// 이중 해싱되지 않습니다. 빈 값이나 마커만 있는 값은 실패하고,
/// 마커로 시작하더라도 다이제스트 형식이 아니면 평문으로 보고 해싱합니다.
///
/// ```
/// use forum_core::credential::hash_password;
///
/// let once = hash_password("correct horse").unwrap();
/// assert_eq!(hash_password(&once).unwrap(), once);
/// ```
pub fn hash_password(value: &str) -> ForumResult<String> {
    if value.is_empty() || value == HASH_MARKER {
        return Err(ForumError::InvalidCredential("Invalid password.".to_string()));
    }
    if is_hashed(value) {
        return Ok(value.to_string());
    }
    Ok(password_digest(value))
}

/// 로그인 비교용 다이제스트.
///
/// [`hash_password`]와 달리 마커 검사를 하지 않습니다. 저장된 다이제스트를
/// 비밀번호로 제출해도 같은 값이 되지 않습니다.
pub fn password_digest(plaintext: &str) -> String {
    format!("{HASH_MARKER}{}", sha256_hex(plaintext))
}

/// 비밀 값에서 확인 키 도출.
pub fn confirmation_key(secret: &str) -> String {
    sha256_hex(secret)
}

/// 제출된 확인 키 검증.
///
/// 빈 값과 리터럴 `"None"`은 키를 지우는 것으로 간주해 허용합니다.
pub fn verify_confirmation_key(secret: Option<&str>, key: &str) -> ForumResult<()> {
    if key.is_empty() || key == "None" {
        return Ok(());
    }

    match secret {
        Some(secret) if confirmation_key(secret) == key => Ok(()),
        _ => Err(ForumError::Validation("Invalid key.".to_string())),
    }
}
