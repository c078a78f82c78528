//! Reading `TransactionResponse` and OWS exception documents.

use geolayer_core::{CommitResponse, ProtocolError};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Pull the first `ExceptionText` (OWS) or `ServiceException` (WMS/WFS
/// 1.0) out of a body, if the body is an exception report.
pub(crate) fn exception_text(body: &str) -> Option<String> {
    if !body.contains("Exception") {
        return None;
    }
    let mut reader = Reader::from_str(body);
    let mut inside = false;
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                inside = matches!(name.as_ref(), b"ExceptionText" | b"ServiceException");
            }
            Ok(Event::Text(t)) if inside => {
                if let Ok(chunk) = t.unescape() {
                    text.push_str(&chunk);
                }
            }
            Ok(Event::End(_)) if inside => {
                let trimmed = text.trim();
                return (!trimmed.is_empty()).then(|| trimmed.to_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Counter {
    Inserted,
    Updated,
    Deleted,
}

/// Turn a WFS transaction answer into a [`CommitResponse`].
///
/// A `TransactionResponse` is a success. An exception report, or a WFS 1.0
/// `FAILED` status, is a well-formed rejection (`success == false`) rather
/// than an error; only undecodable bodies are errors.
pub(crate) fn parse_transaction_response(body: &str) -> Result<CommitResponse, ProtocolError> {
    if let Some(message) = exception_text(body) {
        return Ok(CommitResponse::rejected(message));
    }

    let mut reader = Reader::from_str(body);
    let mut recognised = false;
    let mut failed = false;
    let mut counter: Option<Counter> = None;
    let mut in_message = false;
    let mut message = String::new();
    let mut inserted_ids = Vec::new();
    let (mut updated, mut deleted) = (0u64, 0u64);
    let mut total_inserted: Option<u64> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ProtocolError::InvalidResponse(format!("transaction response: {e}")))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"TransactionResponse" | b"WFS_TransactionResponse" => recognised = true,
                    b"totalInserted" => counter = Some(Counter::Inserted),
                    b"totalUpdated" => counter = Some(Counter::Updated),
                    b"totalDeleted" => counter = Some(Counter::Deleted),
                    b"FAILED" => failed = true,
                    b"Message" => in_message = true,
                    b"FeatureId" => {
                        let fid = e
                            .try_get_attribute("fid")
                            .map_err(|err| ProtocolError::InvalidResponse(err.to_string()))?;
                        if let Some(attr) = fid {
                            let value = attr
                                .unescape_value()
                                .map_err(|err| ProtocolError::InvalidResponse(err.to_string()))?;
                            // "none" is what servers report for inserts they did not keep.
                            if value != "none" {
                                inserted_ids.push(value.into_owned());
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                let content = t
                    .unescape()
                    .map_err(|e| ProtocolError::InvalidResponse(e.to_string()))?;
                let content = content.trim();
                if in_message {
                    message.push_str(content);
                } else if let Some(c) = counter {
                    let n: u64 = content.parse().map_err(|_| {
                        ProtocolError::InvalidResponse(format!("bad transaction total {content:?}"))
                    })?;
                    match c {
                        Counter::Inserted => total_inserted = Some(n),
                        Counter::Updated => updated = n,
                        Counter::Deleted => deleted = n,
                    }
                }
            }
            Event::End(_) => {
                counter = None;
                in_message = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !recognised {
        return Err(ProtocolError::InvalidResponse(
            "not a WFS transaction response".into(),
        ));
    }
    if failed {
        let message = if message.is_empty() {
            "transaction failed".to_owned()
        } else {
            message
        };
        return Ok(CommitResponse::rejected(message));
    }

    let mut response = CommitResponse::accepted()
        .with_inserted(inserted_ids)
        .with_totals(updated, deleted);
    if let Some(total) = total_inserted {
        response.total_inserted = total;
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:TransactionResponse xmlns:wfs="http://www.opengis.net/wfs" xmlns:ogc="http://www.opengis.net/ogc" version="1.1.0">
  <wfs:TransactionSummary>
    <wfs:totalInserted>2</wfs:totalInserted>
    <wfs:totalUpdated>1</wfs:totalUpdated>
    <wfs:totalDeleted>0</wfs:totalDeleted>
  </wfs:TransactionSummary>
  <wfs:TransactionResults/>
  <wfs:InsertResults>
    <wfs:Feature><ogc:FeatureId fid="patios.31"/></wfs:Feature>
    <wfs:Feature><ogc:FeatureId fid="patios.32"/></wfs:Feature>
  </wfs:InsertResults>
</wfs:TransactionResponse>"#;

    #[test]
    fn parses_summary_and_insert_ids() {
        let r = parse_transaction_response(SUCCESS).unwrap();
        assert!(r.is_success());
        assert_eq!(r.inserted_ids, vec!["patios.31", "patios.32"]);
        assert_eq!(r.total_inserted, 2);
        assert_eq!(r.total_updated, 1);
        assert_eq!(r.total_deleted, 0);
    }

    #[test]
    fn exception_report_is_a_rejection() {
        let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows" version="1.0.0">
  <ows:Exception exceptionCode="NoApplicableCode">
    <ows:ExceptionText>Error performing insert: null value in column "nombre"</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
        let r = parse_transaction_response(body).unwrap();
        assert!(!r.is_success());
        assert_eq!(
            r.message.as_deref(),
            Some("Error performing insert: null value in column \"nombre\"")
        );
    }

    #[test]
    fn wfs_1_0_failed_status_is_a_rejection() {
        let body = r#"<wfs:WFS_TransactionResponse xmlns:wfs="http://www.opengis.net/wfs" version="1.0.0">
  <wfs:TransactionResult>
    <wfs:Status><wfs:FAILED/></wfs:Status>
    <wfs:Message>lock expired</wfs:Message>
  </wfs:TransactionResult>
</wfs:WFS_TransactionResponse>"#;
        let r = parse_transaction_response(body).unwrap();
        assert!(!r.is_success());
        assert_eq!(r.message.as_deref(), Some("lock expired"));
    }

    #[test]
    fn unrelated_xml_is_invalid() {
        let err = parse_transaction_response("<html><body>502</body></html>").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidResponse(_)));
    }

    #[test]
    fn exception_text_ignores_plain_bodies() {
        assert_eq!(exception_text("{\"type\":\"FeatureCollection\"}"), None);
    }

    #[test]
    fn exception_text_reads_wms_service_exception() {
        let body = r#"<ServiceExceptionReport version="1.1.1"><ServiceException code="LayerNotDefined">Could not find layer foco</ServiceException></ServiceExceptionReport>"#;
        assert_eq!(exception_text(body).as_deref(), Some("Could not find layer foco"));
    }
}
