// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Progress reporting.

/// Receives `(stage, fraction)` progress events. A `None` fraction means
/// the stage started and its length is not known yet.
pub trait ProgressSink {
    fn report(&mut self, stage: &str, fraction: Option<f64>);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str, Option<f64>),
{
    fn report(&mut self, stage: &str, fraction: Option<f64>) {
        self(stage, fraction)
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _stage: &str, _fraction: Option<f64>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sinks() {
        let mut events = Vec::new();
        {
            let mut sink = |stage: &str, fraction: Option<f64>| events.push((stage.to_string(), fraction));
            sink.report("Converting", None);
            sink.report("Converting", Some(0.5));
        }
        assert_eq!(
            events,
            vec![("Converting".to_string(), None), ("Converting".to_string(), Some(0.5))]
        );
    }
}
