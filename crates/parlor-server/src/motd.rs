//! `/motd` endpoint — a signed message of the day.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use parlor_core::sign;
use serde::Serialize;
use tracing::error;

/// The fixed greeting.
pub const GREETING: &str = "Hello from Funraise, here is your message of the day";

/// Response header carrying the body signature.
pub const SIG_HEADER: &str = "X-FUN-SIG";

/// MOTD response body.
#[derive(Debug, Serialize)]
pub struct MotdBody {
    /// Fixed greeting string.
    pub motd: &'static str,
    /// Current time, RFC 3339.
    pub time: String,
}

/// Build the signed MOTD response.
///
/// The signature is computed over the exact bytes placed in the response
/// body: serialize once, sign that buffer, send that buffer. Signing failure
/// is an internal error for this request only; the header is never omitted
/// from a successful response.
pub fn signed_motd_response(now: chrono::DateTime<chrono::Utc>) -> Response {
    counter!("motd_requests_total").increment(1);

    let body = MotdBody {
        motd: GREETING,
        time: now.to_rfc3339(),
    };
    let bytes = match serde_json::to_vec(&body) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "failed to serialize MOTD body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let sig = match sign::fun_sig(&bytes) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to sign MOTD body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let Ok(sig_value) = HeaderValue::from_str(&sig) else {
        error!("signature is not a valid header value");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::HeaderName::from_static("x-fun-sig"), sig_value),
        ],
        bytes,
    )
        .into_response()
}

/// `GET /motd` handler.
pub async fn motd_handler() -> Response {
    signed_motd_response(chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), 10_000)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn response_is_ok_json() {
        let resp = signed_motd_response(fixed_now());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn body_has_exactly_motd_and_time() {
        let resp = signed_motd_response(fixed_now());
        let bytes = body_bytes(resp).await;
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let obj = parsed.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["motd"], GREETING);
        assert!(obj["time"].as_str().unwrap().starts_with("2026-08-29T12:00:00"));
    }

    #[tokio::test]
    async fn signature_matches_body_bytes() {
        let resp = signed_motd_response(fixed_now());
        let sig = resp
            .headers()
            .get(SIG_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let bytes = body_bytes(resp).await;
        // Re-applying the digest to the exact body bytes reproduces the header
        assert_eq!(sign::fun_sig(&bytes).unwrap(), sig);
    }

    #[tokio::test]
    async fn signature_is_uppercase_hex() {
        let resp = signed_motd_response(fixed_now());
        let sig = resp.headers().get(SIG_HEADER).unwrap().to_str().unwrap();
        assert_eq!(sig.len(), 32);
        assert_eq!(sig, sig.to_uppercase());
    }

    #[tokio::test]
    async fn time_differs_between_calls() {
        let a = signed_motd_response(fixed_now());
        let later = fixed_now() + chrono::Duration::seconds(1);
        let b = signed_motd_response(later);
        let ba: serde_json::Value = serde_json::from_slice(&body_bytes(a).await).unwrap();
        let bb: serde_json::Value = serde_json::from_slice(&body_bytes(b).await).unwrap();
        assert_eq!(ba["motd"], bb["motd"]);
        assert_ne!(ba["time"], bb["time"]);
    }

    #[tokio::test]
    async fn different_times_different_signatures() {
        let a = signed_motd_response(fixed_now());
        let b = signed_motd_response(fixed_now() + chrono::Duration::seconds(1));
        let sig_a = a.headers().get(SIG_HEADER).unwrap().clone();
        let sig_b = b.headers().get(SIG_HEADER).unwrap().clone();
        assert_ne!(sig_a, sig_b);
    }
}
