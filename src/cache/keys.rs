//! Cache key builders and TTL presets.
//!
//! Keys here are logical; the facade adds the namespace prefix. Tenant-scoped
//! families share a `<family>:<tenant>` stem so one pattern invalidates every
//! variant cached for that tenant.

use std::time::Duration;

// == TTL Presets ==
/// Rapidly changing data: notification counts, live order feeds.
pub const TTL_REALTIME: Duration = Duration::from_secs(30);
/// Listings that change with normal admin activity.
pub const TTL_SHORT: Duration = Duration::from_secs(60);
/// Dashboard aggregates and paginated listings.
pub const TTL_MEDIUM: Duration = Duration::from_secs(300);
/// Tenant settings and configuration.
pub const TTL_EXTENDED: Duration = Duration::from_secs(1800);
pub const TTL_LONG: Duration = Duration::from_secs(3600);
/// Near-static reference data: countries, currencies, translations.
pub const TTL_STATIC: Duration = Duration::from_secs(86_400);

// == Tenant Listings ==
pub fn categories(tenant_id: &str) -> String {
    format!("categories:{}", tenant_id)
}

/// One page of a tenant's category listing.
pub fn categories_page(tenant_id: &str, page: u32, per_page: u32) -> String {
    format!("categories:{}:page:{}:{}", tenant_id, page, per_page)
}

pub fn staff(tenant_id: &str) -> String {
    format!("staff:{}", tenant_id)
}

pub fn products(tenant_id: &str, page: u32) -> String {
    format!("products:{}:page:{}", tenant_id, page)
}

pub fn custom_domains(tenant_id: &str) -> String {
    format!("custom-domains:{}", tenant_id)
}

pub fn notifications(tenant_id: &str, user_id: &str) -> String {
    format!("notifications:{}:{}", tenant_id, user_id)
}

pub fn payment_gateways(tenant_id: &str) -> String {
    format!("payment-gateways:{}", tenant_id)
}

pub fn tax_rates(tenant_id: &str, country: &str) -> String {
    format!("tax:{}:{}", tenant_id, country.to_ascii_uppercase())
}

// == Dashboard ==
/// Aggregate for one tenant, metric and reporting range (e.g. "7d").
pub fn dashboard(tenant_id: &str, metric: &str, range: &str) -> String {
    format!("dashboard:{}:{}:{}", tenant_id, metric, range)
}

// == Settings ==
pub fn settings(tenant_id: &str) -> String {
    format!("settings:{}", tenant_id)
}

pub fn settings_section(tenant_id: &str, section: &str) -> String {
    format!("settings:{}:{}", tenant_id, section)
}

// == Static Reference Data ==
pub fn translations(locale: &str, namespace: &str) -> String {
    format!("translations:{}:{}", locale, namespace)
}

pub fn currencies() -> String {
    "reference:currencies".to_string()
}

pub fn countries() -> String {
    "reference:countries".to_string()
}

// == Invalidation Patterns ==
/// Every cached variant of one family for one tenant.
pub fn family_pattern(family: &str, tenant_id: &str) -> String {
    format!("{}:{}*", family, tenant_id)
}

pub fn categories_pattern(tenant_id: &str) -> String {
    family_pattern("categories", tenant_id)
}

pub fn dashboard_pattern(tenant_id: &str) -> String {
    family_pattern("dashboard", tenant_id)
}

pub fn settings_pattern(tenant_id: &str) -> String {
    family_pattern("settings", tenant_id)
}

/// Every entry of every family cached for a tenant.
pub fn tenant_pattern(tenant_id: &str) -> String {
    format!("*:{}*", tenant_id)
}
