//! Diesel table definitions matching `backend/migrations`.
//!
//! Enum columns hold the canonical snake_case text of the domain enums.
//! Weekdays are ISO numbers (Monday = 1). Worked time is whole seconds.

diesel::table! {
    schedules (id) {
        id -> Uuid,
        organization_id -> Uuid,
        name -> Text,
        start_date -> Date,
        end_date -> Date,
        status -> Text,
        notes -> Nullable<Text>,
        created_by -> Uuid,
        approved_by -> Nullable<Uuid>,
        approved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// One staff member's assignment on one date.
    shifts (id) {
        id -> Uuid,
        organization_id -> Uuid,
        schedule_id -> Uuid,
        staff_id -> Uuid,
        client_id -> Nullable<Uuid>,
        shift_date -> Date,
        start_time -> Time,
        end_time -> Time,
        break_start -> Nullable<Time>,
        break_end -> Nullable<Time>,
        meal_start -> Nullable<Time>,
        meal_end -> Nullable<Time>,
        status -> Text,
        shift_type -> Text,
        notes -> Nullable<Text>,
        /// Overrides the client's defaults when present.
        required_documentation -> Nullable<Array<Text>>,
    }
}

diesel::table! {
    staff_availability (id) {
        id -> Uuid,
        organization_id -> Uuid,
        staff_id -> Uuid,
        weekday -> SmallInt,
        start_time -> Time,
        end_time -> Time,
        availability_type -> Text,
        effective_date -> Date,
        expiry_date -> Nullable<Date>,
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    /// Derived rows; a partial unique index keeps one unresolved
    /// `(shift_id, conflict_type)` pair.
    schedule_conflicts (id) {
        id -> Uuid,
        organization_id -> Uuid,
        shift_id -> Uuid,
        staff_id -> Uuid,
        conflict_type -> Text,
        severity -> Text,
        description -> Text,
        detected_at -> Timestamptz,
        resolved -> Bool,
        resolved_by -> Nullable<Uuid>,
        resolved_at -> Nullable<Timestamptz>,
        resolution_notes -> Nullable<Text>,
    }
}

diesel::table! {
    shift_swaps (id) {
        id -> Uuid,
        organization_id -> Uuid,
        requester_id -> Uuid,
        requester_shift_id -> Uuid,
        target_staff_id -> Uuid,
        target_shift_id -> Uuid,
        reason -> Nullable<Text>,
        status -> Text,
        requested_at -> Timestamptz,
        peer_responded_at -> Nullable<Timestamptz>,
        decided_by -> Nullable<Uuid>,
        decided_at -> Nullable<Timestamptz>,
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    /// A partial unique index keeps one pending request per shift.
    coverage_requests (id) {
        id -> Uuid,
        organization_id -> Uuid,
        shift_id -> Uuid,
        requesting_staff_id -> Uuid,
        request_type -> Text,
        reason -> Text,
        status -> Text,
        requested_at -> Timestamptz,
        responded_at -> Nullable<Timestamptz>,
        responded_by -> Nullable<Uuid>,
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    /// One row per shift referenced by a non-terminal swap.
    shift_swap_locks (shift_id) {
        shift_id -> Uuid,
        swap_id -> Uuid,
    }
}

diesel::table! {
    /// Append-only attendance ledger.
    time_clock_entries (id) {
        id -> Uuid,
        organization_id -> Uuid,
        staff_id -> Uuid,
        shift_id -> Nullable<Uuid>,
        entry_type -> Text,
        recorded_at -> Timestamptz,
        location -> Nullable<Text>,
        notes -> Nullable<Text>,
        corrects_entry_id -> Nullable<Uuid>,
        recorded_by -> Uuid,
    }
}

diesel::table! {
    open_clock_intervals (staff_id, interval_kind) {
        staff_id -> Uuid,
        interval_kind -> Text,
        organization_id -> Uuid,
        entry_id -> Uuid,
    }
}

diesel::table! {
    overtime_records (id) {
        id -> Uuid,
        organization_id -> Uuid,
        staff_id -> Uuid,
        week_start -> Date,
        regular_seconds -> BigInt,
        overtime_seconds -> BigInt,
        double_time_seconds -> BigInt,
        holiday_seconds -> BigInt,
        total_seconds -> BigInt,
    }
}

diesel::table! {
    recurring_appointment_templates (id) {
        id -> Uuid,
        organization_id -> Uuid,
        client_id -> Uuid,
        staff_id -> Uuid,
        appointment_type -> Text,
        title -> Text,
        description -> Nullable<Text>,
        location -> Nullable<Text>,
        start_time -> Time,
        duration_minutes -> Integer,
        pattern -> Text,
        weekdays -> Array<SmallInt>,
        start_date -> Date,
        end_date -> Nullable<Date>,
        max_occurrences -> Nullable<Integer>,
        is_active -> Bool,
    }
}

diesel::table! {
    /// Agency-local wall-clock times; unique on `(client_id, staff_id, start_at)`.
    appointments (id) {
        id -> Uuid,
        organization_id -> Uuid,
        template_id -> Nullable<Uuid>,
        client_id -> Uuid,
        staff_id -> Uuid,
        appointment_type -> Text,
        title -> Text,
        description -> Nullable<Text>,
        location -> Nullable<Text>,
        start_at -> Timestamp,
        end_at -> Timestamp,
        status -> Text,
        notes -> Nullable<Text>,
    }
}

diesel::joinable!(shifts -> schedules (schedule_id));
diesel::joinable!(schedule_conflicts -> shifts (shift_id));
diesel::joinable!(shift_swap_locks -> shift_swaps (swap_id));
diesel::joinable!(coverage_requests -> shifts (shift_id));
diesel::joinable!(appointments -> recurring_appointment_templates (template_id));

diesel::allow_tables_to_appear_in_same_query!(
    schedules,
    shifts,
    staff_availability,
    schedule_conflicts,
    shift_swaps,
    shift_swap_locks,
    coverage_requests,
    time_clock_entries,
    open_clock_intervals,
    overtime_records,
    recurring_appointment_templates,
    appointments,
);
