//! Record inspection: discovering ids and embedded records.
//!
//! Every record the resolver obtains is scanned once for:
//!
//! - fields named after a parameter (`userId`), which fill in unknown store ids
//!   and unknown list filter values
//! - fields named `<param>Record` (`userIdRecord`), which supply the record of
//!   another parameter so it never has to be fetched
//!
//! Embedded records are scanned in turn through a FIFO worklist, so a chain
//! such as `addressIdRecord → userIdRecord → groupIdRecord` is fully unpacked
//! from a single response.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::ResolutionContext;
use crate::models::{Record, defined_field, record_field};

/// Fold the ids and embedded records found in `record` into `context`.
///
/// Does nothing when `record` is not a JSON object. Never overwrites an id, a
/// filter value or a record that is already set, so inspecting the same record
/// twice is harmless. Embedded records that get assigned are marked as
/// inspected, since the worklist scans them here.
pub fn inspect(record: &Record, context: &mut ResolutionContext) {
    if !record.is_object() {
        return;
    }

    let bindings = context.bindings().to_vec();
    let mut worklist: VecDeque<Record> = VecDeque::from([record.clone()]);

    while let Some(current) = worklist.pop_front() {
        for binding in &bindings {
            let param = binding.param.as_str();

            if let Some(value) = defined_field(&current, param) {
                if context.set_id_if_unknown(&binding.store, value) {
                    debug!("Discovered {param}={value} for store '{}'", binding.store);
                }
                if context.set_filter_if_unknown(param, value) {
                    trace!("List filter {param}={value}");
                }
            }

            if !context.has_record(param) {
                if let Some(embedded) = defined_field(&current, &record_field(param)) {
                    debug!("Using embedded {} for store '{}'", record_field(param), binding.store);
                    context.assign_record(param, embedded.clone());
                    context.mark_inspected(param);
                    worklist.push_back(embedded.clone());
                }
            }
        }
    }
}
