// libs/appointment-cell/src/services/conflict.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentId, AvailableSlot, SlotCandidate};
use crate::services::time_window::TimeWindowPolicy;

/// Client-side overlap pre-check against an appointment snapshot.
///
/// The snapshot may be stale; the backend remains the authority and reports
/// its own conflicts on write.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapDetector;

impl OverlapDetector {
    pub fn new() -> Self {
        Self
    }

    /// Check whether the candidate slot collides with a live appointment of
    /// the same employee on the same date.
    pub fn has_conflict(
        &self,
        candidate: &SlotCandidate,
        existing: &[Appointment],
        exclude_id: Option<&AppointmentId>,
    ) -> bool {
        self.conflicts(candidate, existing, exclude_id).next().is_some()
    }

    /// Every appointment the candidate collides with, in snapshot order.
    pub fn find_conflicts<'a>(
        &self,
        candidate: &SlotCandidate,
        existing: &'a [Appointment],
        exclude_id: Option<&AppointmentId>,
    ) -> Vec<&'a Appointment> {
        let conflicting: Vec<&Appointment> = self.conflicts(candidate, existing, exclude_id).collect();

        if !conflicting.is_empty() {
            warn!(
                "Conflict detected for employee {:?} on {} - {} conflicting appointments",
                candidate.employee_ref,
                candidate.date,
                conflicting.len()
            );
        }

        conflicting
    }

    /// Free slots of the policy grid for one employee on one date.
    pub fn available_slots(
        &self,
        policy: &TimeWindowPolicy,
        date: NaiveDate,
        employee_ref: Option<&str>,
        existing: &[Appointment],
    ) -> Vec<AvailableSlot> {
        debug!("Computing available slots for employee {:?} on {}", employee_ref, date);

        policy
            .slots()
            .into_iter()
            .filter(|slot| {
                let candidate = SlotCandidate {
                    date,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    employee_ref: employee_ref.map(str::to_string),
                };
                !self.has_conflict(&candidate, existing, None)
            })
            .collect()
    }

    fn conflicts<'a, 'c>(
        &self,
        candidate: &'c SlotCandidate,
        existing: &'a [Appointment],
        exclude_id: Option<&'c AppointmentId>,
    ) -> impl Iterator<Item = &'a Appointment> + 'c
    where
        'a: 'c,
    {
        existing
            .iter()
            .filter(move |apt| exclude_id.map_or(true, |id| &apt.id != id))
            .filter(|apt| apt.blocks_slot())
            .filter(move |apt| apt.date == candidate.date)
            .filter(move |apt| same_employee(candidate.employee_ref.as_deref(), apt.employee_ref.as_deref()))
            .filter(move |apt| {
                intervals_overlap(candidate.start_time, candidate.end_time, apt.start_time, apt.end_time)
            })
    }
}

// An unassigned candidate is checked against everyone on that date.
fn same_employee(candidate: Option<&str>, existing: Option<&str>) -> bool {
    match candidate {
        None => true,
        Some(employee) => existing == Some(employee),
    }
}

/// Half-open intervals: touching endpoints do not overlap.
pub fn intervals_overlap(start1: NaiveTime, end1: NaiveTime, start2: NaiveTime, end2: NaiveTime) -> bool {
    start1 < end2 && start2 < end1
}
