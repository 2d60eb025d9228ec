//! Prometheus metrics for the mailer.
//!
//! This module provides metrics for monitoring template and delivery activity:
//! - Template metrics (registrations by mode, compilations, file fallbacks)
//! - Delivery metrics (emails sent, failures by reason, send latency)

mod helpers;

pub use helpers::{encode_metrics, MailMetrics, TemplateMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "mailer";

lazy_static! {
    // ============================================================================
    // Template Metrics
    // ============================================================================

    /// Template registrations by storage mode
    pub static ref TEMPLATES_REGISTERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_templates_registered_total", METRIC_PREFIX),
        "Total template registrations",
        &["mode"]
    ).unwrap();

    /// Template compilations by source kind
    pub static ref TEMPLATE_COMPILATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_compilations_total", METRIC_PREFIX),
        "Total template compilations",
        &["source"]
    ).unwrap();

    /// Template file reads that fell back to the placeholder body
    pub static ref TEMPLATE_FALLBACKS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_fallbacks_total", METRIC_PREFIX),
        "Total template file reads replaced by the fallback body"
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Emails accepted by the transport
    pub static ref EMAILS_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_emails_sent_total", METRIC_PREFIX),
        "Total emails accepted by the transport"
    ).unwrap();

    /// Failed sends by reason
    pub static ref EMAILS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_emails_failed_total", METRIC_PREFIX),
        "Total failed email sends",
        &["reason"]
    ).unwrap();

    /// Time from send request to transport acknowledgement
    pub static ref EMAIL_SEND_LATENCY: Histogram = register_histogram!(
        format!("{}_email_send_latency_seconds", METRIC_PREFIX),
        "Email send latency in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
}
