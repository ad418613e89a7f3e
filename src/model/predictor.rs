//! Delay prediction with a total contract.

use tracing::warn;

use super::{encode, DelayModel, EncoderTables};
use crate::flight::FlightRecord;

/// Predict the arrival delay in minutes for one flight.
///
/// Never fails: a missing model, an inference error, or a non-finite result
/// all log a warning and return `0.0`. A wrong-but-present number is
/// preferred over propagating an error through the prediction path.
pub fn predict_delay(
    model: Option<&DelayModel>,
    record: &FlightRecord,
    tables: Option<&EncoderTables>,
) -> f64 {
    let Some(model) = model else {
        warn!(
            flight = %record.flight_number,
            "no model loaded, predicting 0.0"
        );
        return 0.0;
    };

    let features = encode(record, tables);
    match model.predict(&features) {
        Ok(delay) if delay.is_finite() => delay,
        Ok(delay) => {
            warn!(flight = %record.flight_number, value = delay, "non-finite prediction, using 0.0");
            0.0
        }
        Err(e) => {
            warn!(flight = %record.flight_number, error = %e, "inference failed, using 0.0");
            0.0
        }
    }
}
