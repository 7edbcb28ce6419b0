//! SQL schema for the rinkstat SQLite store.
//!
//! The event tables mirror what the ingestion pipeline writes; the engine
//! only reads them. Executed once at connection startup.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- ── Events (read-only to the engine) ──────────────────────────────────────

CREATE TABLE IF NOT EXISTS humans (
    human_id    INTEGER PRIMARY KEY,
    first_name  TEXT NOT NULL,
    middle_name TEXT NOT NULL DEFAULT '',
    last_name   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organizations (
    org_id INTEGER PRIMARY KEY,
    name   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS divisions (
    division_id INTEGER PRIMARY KEY,
    org_id      INTEGER NOT NULL,
    level_id    INTEGER              -- NULL when the division is unleveled
);

CREATE TABLE IF NOT EXISTS games (
    game_id             INTEGER PRIMARY KEY,
    org_id              INTEGER NOT NULL,
    division_id         INTEGER NOT NULL,
    date                TEXT NOT NULL,     -- YYYY-MM-DD
    time                TEXT NOT NULL,     -- HH:MM:SS
    status              TEXT NOT NULL,     -- eligible when it starts with 'Final'
    home_team_id        INTEGER NOT NULL,
    visitor_team_id     INTEGER NOT NULL,
    home_final_score    INTEGER,
    visitor_final_score INTEGER,
    home_period_1_shots    INTEGER,
    home_period_2_shots    INTEGER,
    home_period_3_shots    INTEGER,
    home_ot_shots          INTEGER,
    home_so_shots          INTEGER,
    visitor_period_1_shots INTEGER,
    visitor_period_2_shots INTEGER,
    visitor_period_3_shots INTEGER,
    visitor_ot_shots       INTEGER,
    visitor_so_shots       INTEGER,
    referee_1_id        INTEGER,
    referee_2_id        INTEGER,
    scorekeeper_id      INTEGER
);

CREATE TABLE IF NOT EXISTS game_rosters (
    game_id  INTEGER NOT NULL,
    human_id INTEGER NOT NULL,
    team_id  INTEGER NOT NULL,
    role     TEXT NOT NULL DEFAULT ''     -- 'G' marks a goalie
);

CREATE TABLE IF NOT EXISTS goals (
    goal_id        INTEGER PRIMARY KEY,
    game_id        INTEGER NOT NULL,
    goal_scorer_id INTEGER,
    assist_1_id    INTEGER,
    assist_2_id    INTEGER
);

CREATE TABLE IF NOT EXISTS penalties (
    penalty_id          INTEGER PRIMARY KEY,
    game_id             INTEGER NOT NULL,
    penalized_player_id INTEGER,
    penalty_minutes     TEXT               -- integer, 'GM', or blank
);

CREATE TABLE IF NOT EXISTS goalie_saves (
    game_id       INTEGER NOT NULL,
    goalie_id     INTEGER NOT NULL,
    goals_allowed INTEGER NOT NULL DEFAULT 0,
    shots_against INTEGER NOT NULL DEFAULT 0,
    saves_count   INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS games_status_idx    ON games(status);
CREATE INDEX IF NOT EXISTS rosters_game_idx    ON game_rosters(game_id);
CREATE INDEX IF NOT EXISTS goals_game_idx      ON goals(game_id);
CREATE INDEX IF NOT EXISTS penalties_game_idx  ON penalties(game_id);
CREATE INDEX IF NOT EXISTS saves_game_idx      ON goalie_saves(game_id);

-- ── Stats (written only by the engine) ────────────────────────────────────

-- One row per (logical table, aggregation id, human).
CREATE TABLE IF NOT EXISTS scope_stats (
    table_name     TEXT    NOT NULL,   -- e.g. 'division_stats_weekly_goalie'
    aggregation_id INTEGER NOT NULL,
    human_id       INTEGER NOT NULL,
    games          INTEGER NOT NULL,
    total_in_rank  INTEGER NOT NULL,
    first_game_id  INTEGER,
    last_game_id   INTEGER,
    PRIMARY KEY (table_name, aggregation_id, human_id)
);

CREATE TABLE IF NOT EXISTS scope_stat_metrics (
    table_name     TEXT    NOT NULL,
    aggregation_id INTEGER NOT NULL,
    human_id       INTEGER NOT NULL,
    metric         TEXT    NOT NULL,
    value          REAL    NOT NULL,
    rank           INTEGER NOT NULL,
    PRIMARY KEY (table_name, aggregation_id, human_id, metric)
);

-- Holds the watermark as game_id = -1.
CREATE TABLE IF NOT EXISTS game_stats_skater (
    game_id         INTEGER NOT NULL,
    human_id        INTEGER NOT NULL,
    team_id         INTEGER NOT NULL,
    org_id          INTEGER NOT NULL,
    level_id        INTEGER,
    game_date       TEXT    NOT NULL,
    game_time       TEXT    NOT NULL,
    goals           INTEGER NOT NULL,
    assists         INTEGER NOT NULL,
    points          INTEGER NOT NULL,
    penalty_minutes INTEGER NOT NULL,
    created_at      TEXT    NOT NULL,
    PRIMARY KEY (game_id, human_id)
);

CREATE TABLE IF NOT EXISTS game_stats_goalie (
    game_id         INTEGER NOT NULL,
    human_id        INTEGER NOT NULL,
    team_id         INTEGER NOT NULL,
    org_id          INTEGER NOT NULL,
    level_id        INTEGER,
    game_date       TEXT    NOT NULL,
    game_time       TEXT    NOT NULL,
    goals_allowed   INTEGER NOT NULL,
    shots_faced     INTEGER NOT NULL,
    saves           INTEGER NOT NULL,
    save_percentage REAL    NOT NULL,
    created_at      TEXT    NOT NULL,
    PRIMARY KEY (game_id, human_id)
);

CREATE INDEX IF NOT EXISTS skater_lines_start_idx ON game_stats_skater(game_date, game_time);
CREATE INDEX IF NOT EXISTS goalie_lines_start_idx ON game_stats_goalie(game_date, game_time);

PRAGMA user_version = 1;
";
