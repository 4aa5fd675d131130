//! Storydesk - a small content and sales dashboard
//!
//! Browses stories from a headless CMS with a short-lived cache and
//! in-memory filters, looks up CRM company records, and renders meeting
//! notes from a fixed template.

pub mod cms;
pub mod config;
pub mod crm;
pub mod notes;
