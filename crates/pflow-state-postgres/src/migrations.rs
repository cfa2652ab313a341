/// Generate SQL migrations for the PostgreSQL store
///
/// Every statement is idempotent so the list can be applied on each start.
pub fn generate_migrations() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "20240401000000_flows",
            r#"
            CREATE TABLE IF NOT EXISTS flows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                definition JSONB NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
                version INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_flows_updated_at ON flows(updated_at);
            "#,
        ),
        (
            "20240401000001_workorders",
            r#"
            CREATE TABLE IF NOT EXISTS workorders (
                id TEXT PRIMARY KEY,
                flow_id TEXT NOT NULL,
                title TEXT NOT NULL,
                assignee TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                payload JSONB NOT NULL DEFAULT 'null'::jsonb,
                metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workorders_created_at ON workorders(created_at);
            CREATE INDEX IF NOT EXISTS idx_workorders_flow_id ON workorders(flow_id);
            "#,
        ),
    ]
}
