//! Internal error helpers for mapping HTTP/reqwest errors to [`ProtocolError`].

use std::time::Duration;

use geolayer_core::ProtocolError;

/// Map a non-success HTTP status from the feature service to a [`ProtocolError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProtocolError {
    // GeoServer wraps most failures in an OWS exception report; prefer its text.
    if let Some(text) = crate::response::exception_text(body) {
        return ProtocolError::ServiceException(text);
    }
    ProtocolError::Http {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

/// Map a [`reqwest::Error`] to a [`ProtocolError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> ProtocolError {
    if err.is_timeout() {
        ProtocolError::Timeout(timeout)
    } else if err.is_decode() {
        ProtocolError::InvalidResponse(err.to_string())
    } else {
        ProtocolError::Network(Box::new(err))
    }
}

/// Map an XML writer failure to a [`ProtocolError`].
pub(crate) fn xml_error(err: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::Encoding(err.to_string())
}
