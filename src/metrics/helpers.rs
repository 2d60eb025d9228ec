//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL, EMAIL_SEND_LATENCY, TEMPLATES_REGISTERED_TOTAL,
    TEMPLATE_COMPILATIONS_TOTAL, TEMPLATE_FALLBACKS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording template metrics
pub struct TemplateMetrics;

impl TemplateMetrics {
    /// Record a registration under the given storage mode
    pub fn record_registered(mode: &str) {
        TEMPLATES_REGISTERED_TOTAL.with_label_values(&[mode]).inc();
    }

    /// Record a compilation of the given source kind
    pub fn record_compiled(source: &str) {
        TEMPLATE_COMPILATIONS_TOTAL.with_label_values(&[source]).inc();
    }

    /// Record a file read replaced by the fallback body
    pub fn record_fallback() {
        TEMPLATE_FALLBACKS_TOTAL.inc();
    }
}

/// Helper struct for recording delivery metrics
pub struct MailMetrics;

impl MailMetrics {
    /// Record an email accepted by the transport
    pub fn record_sent(latency: Duration) {
        EMAILS_SENT_TOTAL.inc();
        EMAIL_SEND_LATENCY.observe(latency.as_secs_f64());
    }

    /// Record a failed send
    pub fn record_failed(reason: &str) {
        EMAILS_FAILED_TOTAL.with_label_values(&[reason]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_recorded_metrics() {
        TemplateMetrics::record_registered("compiled");
        MailMetrics::record_failed("missing_transport");

        let output = encode_metrics().unwrap();
        assert!(output.contains("mailer_templates_registered_total"));
        assert!(output.contains("mailer_emails_failed_total"));
    }
}
