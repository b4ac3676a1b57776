use axum::extract::{Path, Query, State};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ListQuery};
use crate::database::models::appointment::{
    Appointment, AppointmentActor, AppointmentStatus, DEFAULT_DURATION_MINUTES,
};
use crate::database::models::notification::NotificationKind;
use crate::database::models::property::Property;
use crate::database::models::user::User;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::notifications::notify;
use crate::state::AppState;
use crate::types::Role;

const SORTS: &[SortSpec] = &[
    SortSpec { key: "upcoming", fields: &[("scheduledAt", SortDirection::Asc)] },
    SortSpec { key: "latest", fields: &[("scheduledAt", SortDirection::Desc)] },
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
];

const BOOKING_HORIZON_DAYS: i64 = 365;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub agent_id: Uuid,
    pub property_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 15, max = 240, message = "Duration must be between 15 and 240 minutes"))]
    pub duration_minutes: Option<u32>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentSearch {
    pub status: Option<AppointmentStatus>,
}

/// POST /api/appointments - book time with an agent
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateAppointmentRequest>,
) -> ApiResult<Appointment> {
    let now = Utc::now();
    if body.scheduled_at <= now {
        return Err(ApiError::invalid_field("scheduledAt", "Appointment must be in the future"));
    }
    if body.scheduled_at > now + Duration::days(BOOKING_HORIZON_DAYS) {
        return Err(ApiError::invalid_field(
            "scheduledAt",
            format!("Appointments can be booked at most {} days ahead", BOOKING_HORIZON_DAYS),
        ));
    }
    if body.agent_id == user.user_id {
        return Err(ApiError::bad_request("You cannot book an appointment with yourself"));
    }

    let agent = state.collection::<User>().get(body.agent_id).await?;
    if !agent.as_ref().map_or(false, |a| a.role == Role::Agent) {
        return Err(ApiError::not_found("Agent not found"));
    }
    if let Some(property_id) = body.property_id {
        state.collection::<Property>().get_404(property_id).await?;
    }

    let duration_minutes = body.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    let start = body.scheduled_at;
    let end = start
        .checked_add_signed(Duration::minutes(duration_minutes as i64))
        .ok_or_else(|| ApiError::invalid_field("scheduledAt", "Appointment time is out of range"))?;

    let appointments = state.collection::<Appointment>();
    let booked = appointments
        .find(
            &Filter::new()
                .eq("agentId", body.agent_id)
                .ne("status", AppointmentStatus::Cancelled),
        )
        .await?;
    if booked.iter().any(|existing| existing.overlaps(start, end)) {
        return Err(ApiError::conflict("The agent already has an appointment at that time"));
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        agent_id: body.agent_id,
        user_id: user.user_id,
        property_id: body.property_id,
        scheduled_at: start,
        duration_minutes,
        notes: clean(body.notes),
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    appointments.insert(&appointment).await?;

    notify(
        &state,
        appointment.agent_id,
        NotificationKind::Appointment,
        "New appointment request",
        format!("Appointment requested for {}", start.format("%Y-%m-%d %H:%M UTC")),
        Some(format!("/appointments/{}", appointment.id)),
    )
    .await;

    Ok(ApiResponse::created(appointment).message("Appointment requested"))
}

/// GET /api/appointments - appointments the caller booked
pub async fn list_own(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(search): Query<AppointmentSearch>,
) -> ApiResult<Page<Appointment>> {
    list_by(&state, "userId", user.user_id, &query, search).await
}

/// GET /api/agent/appointments - the agent's calendar
pub async fn list_for_agent(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(search): Query<AppointmentSearch>,
) -> ApiResult<Page<Appointment>> {
    list_by(&state, "agentId", user.user_id, &query, search).await
}

async fn list_by(
    state: &AppState,
    field: &str,
    user_id: Uuid,
    query: &ListQuery,
    search: AppointmentSearch,
) -> ApiResult<Page<Appointment>> {
    let mut filter = Filter::new().eq(field, user_id);
    if let Some(status) = search.status {
        filter = filter.eq("status", status);
    }
    let page = state
        .collection::<Appointment>()
        .page(filter.with_order(query.order(SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// PATCH /api/appointments/:id/status - agent confirms/completes/cancels, requester cancels
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AppointmentStatusRequest>,
) -> ApiResult<Appointment> {
    let appointments = state.collection::<Appointment>();
    let mut appointment = appointments.get_404(id).await?;

    let (actor, counterpart) = if appointment.agent_id == user.user_id {
        (AppointmentActor::Agent, appointment.user_id)
    } else if appointment.user_id == user.user_id {
        (AppointmentActor::Requester, appointment.agent_id)
    } else {
        return Err(ApiError::forbidden("You are not part of this appointment"));
    };

    if !appointment.can_transition(actor, body.status) {
        return Err(ApiError::conflict(format!(
            "Cannot change appointment from {} to {}",
            appointment.status.as_str(),
            body.status.as_str()
        )));
    }

    appointment.status = body.status;
    appointment.updated_at = Utc::now();
    appointments.save(&appointment).await?;

    notify(
        &state,
        counterpart,
        NotificationKind::Appointment,
        "Appointment updated",
        format!("Your appointment is now {}", body.status.as_str()),
        Some(format!("/appointments/{}", appointment.id)),
    )
    .await;

    Ok(ApiResponse::success(appointment).message("Appointment updated"))
}
