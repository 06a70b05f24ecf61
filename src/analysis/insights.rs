//! Rule-based insight derivation over a topic analysis [`ResultMap`].
//!
//! Rules run in a fixed order and each appends at most one sentence:
//! 1. dominant detected topic and its share of all matching cases;
//! 2. long average duration of the dominant topic (complexity warning);
//! 3. sharp month-over-month change in case volume;
//! 4. the runner-up detected topic.
//!
//! The output keeps that order; it is never re-sorted.

use serde_json::Value;

use super::results::{Record, ResultMap, TEMPORAL_KEY, TOPICS_KEY};

/// Average call duration (seconds) above which conversations are flagged as complex.
pub const COMPLEX_DURATION_SECS: f64 = 300.0;

/// Absolute month-over-month change (percent) above which a trend is reported.
pub const TREND_THRESHOLD_PCT: f64 = 50.0;

/// Percent change from `previous` to `last`. Returns 0.0 when `previous` is zero.
pub fn compute_variation(previous: f64, last: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (last - previous) / previous * 100.0
    }
}

/// Derive insights for `topic` from its analysis results.
pub fn derive_insights(topic: &str, results: &ResultMap) -> Vec<String> {
    let mut insights = Vec::new();

    let topics = results
        .get(TOPICS_KEY)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let Some(dominant) = topics.first() {
        let total: f64 = topics.iter().filter_map(|t| number(t, "frecuencia")).sum();
        let frequency = number(dominant, "frecuencia").unwrap_or(0.0);
        let share = if total > 0.0 {
            frequency / total * 100.0
        } else {
            0.0
        };

        insights.push(format!(
            "Se identificaron {} casos con el lema '{}'. El tema dominante es '{}' con {} casos ({:.1}%).",
            format_count(total),
            topic,
            text(dominant, "temas"),
            format_count(frequency),
            share
        ));

        if let Some(duration) = number(dominant, "duracion_promedio") {
            if duration > COMPLEX_DURATION_SECS {
                insights.push(format!(
                    "⚠️ Alerta: Duración promedio de {:.0} segundos ({:.1} minutos) indica conversaciones complejas.",
                    duration,
                    duration / 60.0
                ));
            }
        }
    }

    let temporal = results
        .get(TEMPORAL_KEY)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let [.., previous, last] = temporal {
        let prev_cases = number(previous, "casos").unwrap_or(0.0);
        let last_cases = number(last, "casos").unwrap_or(0.0);
        let variation = compute_variation(prev_cases, last_cases);

        if variation.abs() > TREND_THRESHOLD_PCT {
            let marker = if variation > 0.0 { "📈" } else { "📉" };
            insights.push(format!(
                "{} Tendencia: Variación de {:+.1}% respecto al mes anterior ({} → {} casos).",
                marker,
                variation,
                format_count(prev_cases),
                format_count(last_cases)
            ));
        }
    }

    if let Some(runner_up) = topics.get(1) {
        insights.push(format!(
            "El segundo tema más frecuente es '{}' con {} casos.",
            text(runner_up, "temas"),
            format_count(number(runner_up, "frecuencia").unwrap_or(0.0))
        ));
    }

    insights
}

/// Numeric field, accepting JSON numbers and numeric strings.
pub(crate) fn number(record: &Record, field: &str) -> Option<f64> {
    match record.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Field rendered as display text; `null` or missing becomes "sin clasificar".
pub(crate) fn text(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "sin clasificar".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Counts print without decimals when they are whole numbers.
pub(crate) fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}
