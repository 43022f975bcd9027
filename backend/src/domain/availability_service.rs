//! Staff availability maintenance.
//!
//! Rules feed conflict detection, so two rules for one staff member may not
//! cover the same weekday time on a shared date.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::conflict_detector::map_availability_error;
use crate::domain::ports::{
    AvailabilityCommand, AvailabilityRepository, AvailabilitySlot, CapabilityCheck,
    CreateAvailabilityRequest, DeleteAvailabilityRequest, ListAvailabilityRequest,
    ReplaceAvailabilityRequest, TenantDirectory, UpdateAvailabilityRequest,
};
use crate::domain::service_support::{authorize, map_directory_error};
use crate::domain::{
    Actor, AvailabilityId, Capability, Error, StaffAvailability, StaffAvailabilityDraft, StaffId,
    TimeWindow,
};

fn rule_from_slot(
    id: AvailabilityId,
    actor: &Actor,
    staff_id: StaffId,
    slot: AvailabilitySlot,
) -> Result<StaffAvailability, Error> {
    let window =
        TimeWindow::new(slot.start, slot.end).map_err(|err| Error::validation(err.to_string()))?;
    StaffAvailability::new(StaffAvailabilityDraft {
        id,
        organization_id: actor.organization_id,
        staff_id,
        weekday: slot.weekday,
        window,
        availability_type: slot.availability_type,
        effective_date: slot.effective_date,
        expiry_date: slot.expiry_date,
        notes: slot.notes,
    })
    .map_err(|err| Error::validation(err.to_string()))
}

/// Domain service implementing [`AvailabilityCommand`].
pub struct AvailabilityService<A, T, K> {
    availability: Arc<A>,
    directory: Arc<T>,
    access: Arc<K>,
}

impl<A, T, K> AvailabilityService<A, T, K> {
    pub fn new(availability: Arc<A>, directory: Arc<T>, access: Arc<K>) -> Self {
        Self {
            availability,
            directory,
            access,
        }
    }
}

impl<A, T, K> AvailabilityService<A, T, K>
where
    A: AvailabilityRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    async fn ensure_staff(&self, actor: &Actor, staff_id: StaffId) -> Result<(), Error> {
        let exists = self
            .directory
            .staff_exists(actor.organization_id, staff_id)
            .await
            .map_err(map_directory_error)?;
        if exists {
            Ok(())
        } else {
            Err(Error::not_found(format!("staff member {staff_id} not found")))
        }
    }

    async fn load_rule(
        &self,
        actor: &Actor,
        staff_id: StaffId,
        availability_id: AvailabilityId,
    ) -> Result<StaffAvailability, Error> {
        self.availability
            .find(actor.organization_id, availability_id)
            .await
            .map_err(map_availability_error)?
            .filter(|rule| rule.staff_id() == staff_id)
            .ok_or_else(|| {
                Error::not_found(format!("availability slot {availability_id} not found"))
            })
    }

    /// Reject `rule` when it clashes with a stored rule other than itself.
    async fn ensure_no_clash(&self, actor: &Actor, rule: &StaffAvailability) -> Result<(), Error> {
        let stored = self
            .availability
            .list_for_staff(actor.organization_id, rule.staff_id(), None)
            .await
            .map_err(map_availability_error)?;
        match stored.iter().find(|other| rule.clashes_with(other)) {
            Some(other) => Err(Error::invalid_state(format!(
                "availability overlaps slot {} on {}",
                other.id(),
                other.weekday()
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<A, T, K> AvailabilityCommand for AvailabilityService<A, T, K>
where
    A: AvailabilityRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    async fn list_availability(
        &self,
        request: ListAvailabilityRequest,
    ) -> Result<Vec<StaffAvailability>, Error> {
        let actor = request.actor;
        if !actor.is_staff(request.staff_id) {
            authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;
        }
        self.ensure_staff(&actor, request.staff_id).await?;
        self.availability
            .list_for_staff(actor.organization_id, request.staff_id, request.effective_on)
            .await
            .map_err(map_availability_error)
    }

    async fn create_availability(
        &self,
        request: CreateAvailabilityRequest,
    ) -> Result<StaffAvailability, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;
        self.ensure_staff(&actor, request.staff_id).await?;

        let rule = rule_from_slot(
            AvailabilityId::random(),
            &actor,
            request.staff_id,
            request.slot,
        )?;
        self.ensure_no_clash(&actor, &rule).await?;
        self.availability
            .save(&rule)
            .await
            .map_err(map_availability_error)?;
        info!(
            availability_id = %rule.id(),
            staff_id = %rule.staff_id(),
            weekday = %rule.weekday(),
            "availability slot created"
        );
        Ok(rule)
    }

    async fn update_availability(
        &self,
        request: UpdateAvailabilityRequest,
    ) -> Result<StaffAvailability, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;
        self.ensure_staff(&actor, request.staff_id).await?;

        let current = self
            .load_rule(&actor, request.staff_id, request.availability_id)
            .await?;
        let rule = rule_from_slot(current.id(), &actor, request.staff_id, request.slot)?;
        self.ensure_no_clash(&actor, &rule).await?;
        self.availability
            .save(&rule)
            .await
            .map_err(map_availability_error)?;
        info!(availability_id = %rule.id(), "availability slot updated");
        Ok(rule)
    }

    async fn delete_availability(&self, request: DeleteAvailabilityRequest) -> Result<(), Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;
        self.ensure_staff(&actor, request.staff_id).await?;

        let rule = self
            .load_rule(&actor, request.staff_id, request.availability_id)
            .await?;
        let removed = self
            .availability
            .delete(actor.organization_id, rule.id())
            .await
            .map_err(map_availability_error)?;
        if !removed {
            return Err(Error::not_found(format!(
                "availability slot {} not found",
                rule.id()
            )));
        }
        info!(availability_id = %rule.id(), "availability slot deleted");
        Ok(())
    }

    async fn replace_availability(
        &self,
        request: ReplaceAvailabilityRequest,
    ) -> Result<Vec<StaffAvailability>, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;
        self.ensure_staff(&actor, request.staff_id).await?;

        let rules = request
            .slots
            .into_iter()
            .map(|slot| rule_from_slot(AvailabilityId::random(), &actor, request.staff_id, slot))
            .collect::<Result<Vec<_>, _>>()?;
        for (index, rule) in rules.iter().enumerate() {
            if let Some(other) = rules[index + 1..].iter().find(|other| rule.clashes_with(other)) {
                return Err(Error::validation(format!(
                    "submitted slots overlap on {}: {}-{} and {}-{}",
                    rule.weekday(),
                    rule.window().start(),
                    rule.window().end(),
                    other.window().start(),
                    other.window().end()
                )));
            }
        }

        self.availability
            .replace_for_staff(actor.organization_id, request.staff_id, &rules)
            .await
            .map_err(map_availability_error)?;
        info!(
            staff_id = %request.staff_id,
            slot_count = rules.len(),
            "availability replaced"
        );
        Ok(rules)
    }
}

#[cfg(test)]
#[path = "availability_service_tests.rs"]
mod tests;
