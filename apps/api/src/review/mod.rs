//! Candidate review workflow: scoring and cards, staged decisions, reason
//! capture, bulk selection and batched submission to the audit log.

pub mod card;
pub mod drafts;
pub mod handlers;
pub mod reason;
pub mod scoring;
pub mod selection;
pub mod storage;
pub mod submission;
pub mod view;
pub mod workbench;
