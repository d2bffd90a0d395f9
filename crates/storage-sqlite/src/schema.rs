diesel::table! {
    financial_events (id) {
        id -> Text,
        account_id -> Text,
        event_timestamp -> Timestamp,
        event_type -> Text,
        description -> Text,

        // Decimals stored as text to avoid float drift
        cash_impact -> Text,
        realized_pnl -> Text,
        commission -> Text,
        currency -> Text,

        // Identity / dedup keys
        source_transaction_id -> Nullable<Text>,
        contract_key -> Nullable<Text>,
        expiration_date -> Nullable<Date>,

        // Synthetic lifecycle
        is_synthetic -> Bool,
        synthetic_status -> Text,
        confirmed_timestamp -> Nullable<Timestamp>,

        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    daily_summaries (id) {
        id -> Text,
        account_id -> Text,
        summary_date -> Date,

        opening_nav -> Nullable<Text>,
        adjusted_opening_nav -> Nullable<Text>,
        closing_nav -> Text,
        closing_observed -> Bool,

        gross_pnl -> Text,
        net_pnl -> Text,
        net_cash_flow -> Text,
        deposits -> Text,
        withdrawals -> Text,
        total_commissions -> Text,
        total_fees -> Text,
        total_interest -> Text,
        exercise_proceeds -> Text,
        exercise_commissions -> Text,

        reconciliation_difference -> Text,
        is_reconciled -> Bool,
        daily_return_pct -> Nullable<Text>,

        calculated_at -> Timestamp,
    }
}

diesel::table! {
    nav_observations (account_id, observation_date) {
        account_id -> Text,
        observation_date -> Date,
        nav -> Text,
        source -> Text,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    import_runs (account_id, run_date) {
        id -> Text,
        account_id -> Text,
        run_date -> Date,
        status -> Text,
        records_seen -> Integer,
        events_appended -> Integer,
        malformed_skipped -> Integer,
        started_at -> Timestamp,
        completed_at -> Nullable<Timestamp>,
        error -> Nullable<Text>,
    }
}
