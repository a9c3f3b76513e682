// src/services/deviation_service.rs

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::next_counter,
        error::{AppError, RuleViolation},
    },
    db::DeviationRepository,
    models::{
        auth::{roles, User},
        deviations::{
            ActionStatus, Approval, ApprovalRole, Approvals, CorrectiveAction, CorrectiveActionPayload, Deviation,
            DeviationFilter, DeviationPayload, DeviationStatus,
        },
    },
};

#[derive(Clone)]
pub struct DeviationService {
    deviation_repo: DeviationRepository,
}

// ---
// Status machine
// ---

pub(crate) fn initial_status(draft: bool) -> DeviationStatus {
    if draft { DeviationStatus::Draft } else { DeviationStatus::Approval }
}

pub(crate) fn format_internal_id(year: i32, seq: i32) -> String {
    format!("DEV-{}-{}", year, seq)
}

/// Content may change while nobody signed off yet: draft or approval.
pub(crate) fn check_editable(deviation: &Deviation, user: &User) -> Result<(), AppError> {
    if deviation.owner != user.email && !user.is_admin() {
        return Err(RuleViolation::NotOwner.into());
    }
    match deviation.status {
        DeviationStatus::Draft | DeviationStatus::Approval => Ok(()),
        _ => Err(RuleViolation::InvalidTransition.into()),
    }
}

/// Records one sign-off and returns the resulting stored status.
pub(crate) fn apply_approval(
    status: DeviationStatus,
    approvals: &mut Approvals,
    role: ApprovalRole,
    approved: bool,
    reason: Option<&str>,
    by: &str,
    at: DateTime<Utc>,
) -> Result<DeviationStatus, AppError> {
    match (status, role) {
        (DeviationStatus::Approval, _) => {}
        // late plant manager sign-off on an already approved deviation
        (DeviationStatus::Approved, ApprovalRole::PlantManager) => {}
        _ => return Err(RuleViolation::InvalidTransition.into()),
    }

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if !approved && reason.is_none() {
        return Err(RuleViolation::ReasonRequired.into());
    }

    *approvals.slot_mut(role) = Some(Approval {
        approved,
        by: by.to_string(),
        at,
        reason: reason.map(str::to_string),
    });

    Ok(if approvals.any_rejected() {
        DeviationStatus::Rejected
    } else if approvals.required_approved() {
        DeviationStatus::Approved
    } else {
        DeviationStatus::Approval
    })
}

fn may_add_action(deviation: &Deviation, user: &User) -> bool {
    deviation.owner == user.email || user.has_any_role(&[roles::QUALITY, roles::QUALITY_MANAGER])
}

fn may_close_action(deviation: &Deviation, action: &CorrectiveAction, user: &User) -> bool {
    action.responsible.eq_ignore_ascii_case(&user.email) || may_add_action(deviation, user)
}

impl DeviationService {
    pub fn new(deviation_repo: DeviationRepository) -> Self {
        Self { deviation_repo }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    async fn load_for_update(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Deviation, AppError> {
        self.deviation_repo
            .find_for_update(conn, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("deviation".into()))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        owner: &User,
        payload: &DeviationPayload,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let year = Self::today().year();
        let seq = next_counter(&mut *tx, tenant_id, &format!("deviation-{}", year)).await?;
        let internal_id = format_internal_id(year, seq);

        let deviation = self
            .deviation_repo
            .insert(&mut *tx, tenant_id, &internal_id, initial_status(payload.draft), &owner.email, payload)
            .await?;

        tx.commit().await?;

        tracing::info!("deviation {} created by {} as {:?}", deviation.internal_id, owner.email, deviation.status);
        Ok(deviation.with_effective_status(Self::today()))
    }

    pub async fn submit<'e, E>(&self, executor: E, tenant_id: Uuid, user: &User, id: Uuid) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let deviation = self.load_for_update(&mut tx, tenant_id, id).await?;

        if deviation.owner != user.email {
            return Err(RuleViolation::NotOwner.into());
        }
        if deviation.status != DeviationStatus::Draft {
            return Err(RuleViolation::InvalidTransition.into());
        }

        let deviation = self
            .deviation_repo
            .update_status(&mut *tx, tenant_id, id, DeviationStatus::Approval, &Approvals::default())
            .await?;
        tx.commit().await?;

        tracing::info!("deviation {} submitted for approval", deviation.internal_id);
        Ok(deviation.with_effective_status(Self::today()))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: &DeviationPayload,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let current = self.load_for_update(&mut tx, tenant_id, id).await?;
        check_editable(&current, user)?;

        // An edited deviation needs fresh signatures.
        let deviation = self
            .deviation_repo
            .update_content(&mut *tx, tenant_id, id, current.status, payload)
            .await?;
        tx.commit().await?;

        tracing::info!("deviation {} edited by {}", deviation.internal_id, user.email);
        Ok(deviation.with_effective_status(Self::today()))
    }

    pub async fn approve<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        role: ApprovalRole,
        approved: bool,
        reason: Option<&str>,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !user.has_role(role.required_role()) {
            return Err(AppError::Forbidden(role.required_role().to_string()));
        }

        let mut tx = executor.begin().await?;
        let current = self.load_for_update(&mut tx, tenant_id, id).await?;

        let mut approvals = current.approvals.0.clone();
        let status = apply_approval(current.status, &mut approvals, role, approved, reason, &user.email, Utc::now())?;

        let deviation = self
            .deviation_repo
            .update_status(&mut *tx, tenant_id, id, status, &approvals)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "deviation {} {} by {} as {:?}, status {:?}",
            deviation.internal_id,
            if approved { "approved" } else { "rejected" },
            user.email,
            role,
            deviation.status
        );
        Ok(deviation.with_effective_status(Self::today()))
    }

    pub async fn add_corrective_action<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: &CorrectiveActionPayload,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let current = self.load_for_update(&mut tx, tenant_id, id).await?;
        if !may_add_action(&current, user) {
            return Err(RuleViolation::NotOwner.into());
        }

        let mut actions = current.corrective_actions.0.clone();
        actions.push(CorrectiveAction {
            id: Uuid::new_v4(),
            description: payload.description.trim().to_string(),
            responsible: payload.responsible.trim().to_lowercase(),
            deadline: payload.deadline,
            status: ActionStatus::Open,
            created_by: user.email.clone(),
            created_at: Utc::now(),
            closed_at: None,
        });

        let deviation = self.deviation_repo.update_actions(&mut *tx, tenant_id, id, &actions).await?;
        tx.commit().await?;

        tracing::info!("corrective action added to {} by {}", deviation.internal_id, user.email);
        Ok(deviation.with_effective_status(Self::today()))
    }

    pub async fn close_corrective_action<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        action_id: Uuid,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let current = self.load_for_update(&mut tx, tenant_id, id).await?;

        let mut actions = current.corrective_actions.0.clone();
        let action = actions
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| AppError::ResourceNotFound("corrective action".into()))?;

        if !may_close_action(&current, action, user) {
            return Err(RuleViolation::NotOwner.into());
        }
        if action.status == ActionStatus::Closed {
            return Err(RuleViolation::InvalidTransition.into());
        }
        action.status = ActionStatus::Closed;
        action.closed_at = Some(Utc::now());

        let deviation = self.deviation_repo.update_actions(&mut *tx, tenant_id, id, &actions).await?;
        tx.commit().await?;

        tracing::info!("corrective action {} of {} closed by {}", action_id, deviation.internal_id, user.email);
        Ok(deviation.with_effective_status(Self::today()))
    }

    /// Owners may discard their drafts; admins may delete anything.
    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, user: &User, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let current = self.load_for_update(&mut tx, tenant_id, id).await?;

        if !user.is_admin() {
            if current.owner != user.email {
                return Err(RuleViolation::NotOwner.into());
            }
            if current.status != DeviationStatus::Draft {
                return Err(RuleViolation::InvalidTransition.into());
            }
        }

        self.deviation_repo.delete(&mut *tx, tenant_id, id).await?;
        tx.commit().await?;

        tracing::info!("deviation {} deleted by {}", current.internal_id, user.email);
        Ok(())
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.deviation_repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .map(|d| d.with_effective_status(Self::today()))
            .ok_or_else(|| AppError::ResourceNotFound("deviation".into()))
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &DeviationFilter) -> Result<Vec<Deviation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let today = Self::today();
        let deviations = self
            .deviation_repo
            .list(executor, tenant_id, filter)
            .await?
            .into_iter()
            .map(|d| d.with_effective_status(today))
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .collect();
        Ok(deviations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::CredentialSource, deviations::DeviationArea};
    use sqlx::types::Json;

    fn user(email: &str, user_roles: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            roles: user_roles.iter().map(|r| r.to_string()).collect(),
            credential_source: CredentialSource::Manual,
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn deviation(status: DeviationStatus) -> Deviation {
        let today = Utc::now().date_naive();
        Deviation {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            internal_id: "DEV-2024-1".into(),
            status,
            article_number: "28042".into(),
            article_name: "Bracket".into(),
            workplace: None,
            drawing_number: None,
            quantity: Some(50),
            charge: None,
            description: "Burr on the mounting hole".into(),
            reason: "Worn tool".into(),
            customer_number: None,
            customer_authorization: false,
            area: DeviationArea::Production,
            period_from: today,
            period_to: today,
            owner: "owner@bruss.example".into(),
            approvals: Json(Approvals::default()),
            corrective_actions: Json(vec![]),
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    fn approve(status: DeviationStatus, approvals: &mut Approvals, role: ApprovalRole) -> Result<DeviationStatus, AppError> {
        apply_approval(status, approvals, role, true, None, "x@bruss.example", Utc::now())
    }

    #[test]
    fn submitted_deviation_starts_in_approval() {
        assert_eq!(initial_status(false), DeviationStatus::Approval);
        assert_eq!(initial_status(true), DeviationStatus::Draft);
    }

    #[test]
    fn internal_id_has_year_and_sequence() {
        assert_eq!(format_internal_id(2024, 17), "DEV-2024-17");
    }

    #[test]
    fn three_required_approvals_approve() {
        let mut approvals = Approvals::default();
        let mut status = DeviationStatus::Approval;
        status = approve(status, &mut approvals, ApprovalRole::GroupLeader).unwrap();
        assert_eq!(status, DeviationStatus::Approval);
        status = approve(status, &mut approvals, ApprovalRole::QualityManager).unwrap();
        assert_eq!(status, DeviationStatus::Approval);
        status = approve(status, &mut approvals, ApprovalRole::ProductionManager).unwrap();
        assert_eq!(status, DeviationStatus::Approved);

        // late plant manager sign-off keeps it approved
        status = approve(status, &mut approvals, ApprovalRole::PlantManager).unwrap();
        assert_eq!(status, DeviationStatus::Approved);
        assert!(approvals.plant_manager.is_some());
    }

    #[test]
    fn rejection_needs_a_reason() {
        let mut approvals = Approvals::default();
        let err = apply_approval(
            DeviationStatus::Approval,
            &mut approvals,
            ApprovalRole::QualityManager,
            false,
            Some("  "),
            "qm@bruss.example",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::RuleViolated(RuleViolation::ReasonRequired)));
        assert!(approvals.quality_manager.is_none());
    }

    #[test]
    fn any_rejection_rejects() {
        let mut approvals = Approvals::default();
        approve(DeviationStatus::Approval, &mut approvals, ApprovalRole::GroupLeader).unwrap();
        let status = apply_approval(
            DeviationStatus::Approval,
            &mut approvals,
            ApprovalRole::ProductionManager,
            false,
            Some("Customer refuses"),
            "pm@bruss.example",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(status, DeviationStatus::Rejected);
    }

    #[test]
    fn drafts_and_rejected_deviations_cannot_be_signed() {
        let mut approvals = Approvals::default();
        for status in [DeviationStatus::Draft, DeviationStatus::Rejected] {
            let err = approve(status, &mut approvals, ApprovalRole::GroupLeader).unwrap_err();
            assert!(matches!(err, AppError::RuleViolated(RuleViolation::InvalidTransition)));
        }
        let err = approve(DeviationStatus::Approved, &mut approvals, ApprovalRole::GroupLeader).unwrap_err();
        assert!(matches!(err, AppError::RuleViolated(RuleViolation::InvalidTransition)));
    }

    #[test]
    fn only_owner_edits_open_deviations() {
        let owner = user("owner@bruss.example", &[roles::OPERATOR]);
        let other = user("other@bruss.example", &[roles::OPERATOR]);

        assert!(check_editable(&deviation(DeviationStatus::Draft), &owner).is_ok());
        assert!(check_editable(&deviation(DeviationStatus::Approval), &owner).is_ok());
        assert!(matches!(
            check_editable(&deviation(DeviationStatus::Draft), &other),
            Err(AppError::RuleViolated(RuleViolation::NotOwner))
        ));
        assert!(matches!(
            check_editable(&deviation(DeviationStatus::Approved), &owner),
            Err(AppError::RuleViolated(RuleViolation::InvalidTransition))
        ));
    }

    #[test]
    fn responsible_person_may_close_action() {
        let dev = deviation(DeviationStatus::Approved);
        let action = CorrectiveAction {
            id: Uuid::new_v4(),
            description: "Replace tool".into(),
            responsible: "tech@bruss.example".into(),
            deadline: Utc::now().date_naive(),
            status: ActionStatus::Open,
            created_by: "owner@bruss.example".into(),
            created_at: Utc::now(),
            closed_at: None,
        };
        assert!(may_close_action(&dev, &action, &user("tech@bruss.example", &[])));
        assert!(may_close_action(&dev, &action, &user("owner@bruss.example", &[])));
        assert!(may_close_action(&dev, &action, &user("q@bruss.example", &[roles::QUALITY])));
        assert!(!may_close_action(&dev, &action, &user("op@bruss.example", &[roles::OPERATOR])));
    }

    #[test]
    fn only_owner_or_quality_adds_actions() {
        let dev = deviation(DeviationStatus::Approval);
        assert!(may_add_action(&dev, &user("owner@bruss.example", &[roles::OPERATOR])));
        assert!(may_add_action(&dev, &user("qm@bruss.example", &[roles::QUALITY_MANAGER])));
        assert!(may_add_action(&dev, &user("boss@bruss.example", &[roles::ADMIN])));
        assert!(!may_add_action(&dev, &user("op@bruss.example", &[roles::OPERATOR])));
    }
}
