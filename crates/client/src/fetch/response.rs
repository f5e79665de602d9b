//! Decoding of `/calendar-data` responses.

use availcal_core::model::{CalendarData, ErrorBody};
use availcal_core::{DayRecords, Error};

/// Longest slice of an unparseable error body quoted in the failure message.
const MAX_QUOTED_BODY: usize = 200;

/// Turn a status code and body into day records.
///
/// Non-200 answers become `NetworkFailure` carrying the endpoint's `error`
/// message when present. A 200 whose body is not the expected JSON becomes
/// `MalformedResponse`.
pub fn decode(status: u16, body: &[u8]) -> Result<DayRecords, Error> {
    if status != 200 {
        let message = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(err) => err.error,
            Err(_) => quote_body(body),
        };
        return Err(Error::NetworkFailure(format!("status {status}: {message}")));
    }

    let data: CalendarData =
        serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

    if let Some(currency) = &data.currency_code {
        tracing::trace!("calendar data priced in {}", currency);
    }

    Ok(data.dates)
}

fn quote_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    text.chars().take(MAX_QUOTED_BODY).collect()
}
