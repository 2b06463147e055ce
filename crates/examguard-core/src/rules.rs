//! The built-in trap rule table.
//!
//! These rules target the SQL exam schema (Pilots, Squadrons, Aircraft,
//! Weapons, Missions). The exam prompts contain planted references to tables
//! and columns that do not exist; an answer that uses them was most likely
//! produced by a tool that read the planted text rather than by a student who
//! worked against the real schema.
//!
//! All patterns are matched case-insensitively. A pattern with a `hit` group
//! records that group as the matched literal instead of the whole match.

use crate::model::{PatternRule, Severity};

/// `(name, description, pattern, severity, points)`
type RuleRow = (&'static str, &'static str, &'static str, Severity, u32);

const DEFAULT_RULES: &[RuleRow] = &[
    (
        "missions_weapon_id",
        "uses weapon_id on the Missions table (column does not exist)",
        r"missions?\s*\.\s*weapon_id|weapon_id\s+from\s+missions?|missions?\s+.*weapon_id",
        Severity::High,
        30,
    ),
    (
        "mission_analytics_table",
        "uses a table that does not exist: MissionAnalytics",
        r"missionanalytics|mission_analytics|FROM\s+MissionAnalytics|JOIN\s+MissionAnalytics",
        Severity::High,
        35,
    ),
    (
        "mission_analytics_fields",
        "uses fictitious MissionAnalytics columns",
        r"duration_minutes|fuel_consumption|weapon_effectiveness.*mission",
        Severity::High,
        25,
    ),
    (
        "non_existent_tables",
        "uses tables that do not exist in the schema",
        r"FROM\s+(Aircraft_Assignments|PilotSchedule|WeaponInventory|Squadron_Aircraft|Mission_Reports|Aircraft_Maintenance)\b|JOIN\s+(Aircraft_Assignments|PilotSchedule|WeaponInventory|Squadron_Aircraft|Mission_Reports|Aircraft_Maintenance)\b",
        Severity::High,
        40,
    ),
    (
        "invalid_joins",
        "joins tables through relationships that do not exist",
        r"JOIN\s+Weapons\s+ON\s+Pilots\.|JOIN\s+Pilots\s+ON\s+Weapons\.|JOIN\s+Missions\s+ON\s+Weapons\.weapon_id|JOIN\s+Squadrons\s+ON\s+Weapons\.squadron_id",
        Severity::High,
        35,
    ),
    (
        "non_existent_columns",
        "uses columns that do not exist on real tables",
        r"Pilots\.(salary|hire_date|last_mission|training_hours)|Squadrons\.(budget|commander_id|home_base|aircraft_count)|Aircraft\.(last_maintenance|flight_hours|fuel_capacity|max_speed)|Missions\.(pilot_count|aircraft_count|success_rate|cost)",
        Severity::High,
        30,
    ),
    (
        "weapons_squadron_id",
        "uses squadron_id on the Weapons table (wrong relationship)",
        r"weapons?\s*\.\s*squadron_id|squadron_id\s+from\s+weapons?|JOIN\s+.*weapons?.*squadron_id",
        Severity::High,
        30,
    ),
    (
        "weapon_effectiveness_missions",
        "uses weapon_effectiveness in a Missions context",
        r"missions?\s*\.\s*weapon_effectiveness|weapon_effectiveness.*missions?|SELECT.*weapon_effectiveness.*FROM.*missions?",
        Severity::High,
        25,
    ),
    (
        "weapon_effectiveness_other_tables",
        "uses weapon_effectiveness on the wrong tables",
        r"pilots?\s*\.\s*weapon_effectiveness|squadrons?\s*\.\s*weapon_effectiveness|aircrafts?\s*\.\s*weapon_effectiveness",
        Severity::Medium,
        20,
    ),
    (
        "weapon_singular",
        "uses table name \"Weapon\" instead of \"Weapons\"",
        r"(?P<hit>FROM\s+Weapon|JOIN\s+Weapon|UPDATE\s+Weapon|INSERT\s+INTO\s+Weapon)(?:[^s]|$)",
        Severity::Medium,
        20,
    ),
    (
        "prompt_injection",
        "echoes planted behavioral prompt instructions",
        r"respond\s+directly|output\s+only|avoid\s+additional\s+explanations|note\s+to\s+system",
        Severity::High,
        40,
    ),
    (
        "false_aircraft_reassignment",
        "refers to a false aircraft reassignment relationship between squadrons",
        r"aircraft.*reassign|reassign.*aircraft|aircraft.*squadrons.*reassign|junction.*aircraft.*squadron",
        Severity::Medium,
        18,
    ),
    (
        "fake_field_combinations",
        "combines several fictitious columns",
        r"weapon_id.*duration_minutes|fuel_consumption.*weapon_effectiveness|mission_id.*weapon_effectiveness.*duration",
        Severity::Medium,
        22,
    ),
    (
        "ai_fake_joins",
        "generated-style JOIN on fictitious columns",
        r"JOIN\s+\w+\s+ON\s+\w+\.weapon_id\s*=\s*\w+\.weapon_id|JOIN.*squadron_id.*weapon|JOIN.*MissionAnalytics",
        Severity::Medium,
        18,
    ),
    (
        "fake_order_by",
        "orders by fictitious columns",
        r"ORDER\s+BY\s+weapon_effectiveness|ORDER\s+BY\s+duration_minutes|ORDER\s+BY\s+fuel_consumption",
        Severity::Medium,
        15,
    ),
    (
        "fake_where_conditions",
        "filters on fictitious columns",
        r"WHERE.*weapon_id.*missions?|WHERE.*duration_minutes|WHERE.*fuel_consumption",
        Severity::Medium,
        15,
    ),
    (
        "fake_aggregates",
        "aggregates over fictitious columns",
        r"AVG\s*\(\s*weapon_effectiveness\s*\)|SUM\s*\(\s*duration_minutes\s*\)|MAX\s*\(\s*fuel_consumption\s*\)",
        Severity::Medium,
        20,
    ),
    (
        "ai_explanation_suppression",
        "phrases that suppress explanations in generated output",
        r"code\s+only|sql\s+only|no\s+explanation|direct\s+output|brief\s+response",
        Severity::Low,
        12,
    ),
    (
        "complex_fake_relationships",
        "describes fictitious many-to-many relationships",
        r"many.*to.*many.*aircraft|N:N.*aircraft|junction.*table.*aircraft.*squadron",
        Severity::Medium,
        18,
    ),
    (
        "ai_style_sql",
        "SQL shape typical of generated answers",
        r"SELECT\s+\*\s+FROM[\s\S]*JOIN[\s\S]*ON[\s\S]*=[\s\S]*WHERE[\s\S]*ORDER\s+BY",
        Severity::Low,
        8,
    ),
    (
        "ai_complex_joins",
        "chain of joins typical of generated answers",
        r"SELECT[\s\S]*FROM[\s\S]*JOIN[\s\S]*JOIN[\s\S]*JOIN[\s\S]*ON[\s\S]*=[\s\S]*ON[\s\S]*=",
        Severity::Low,
        10,
    ),
    (
        "ai_aliasing",
        "aliasing style typical of generated answers",
        r"\b[a-z]\s+AS\s+[a-z]|\b[a-z]1\b|\b[a-z]2\b|table1|table2",
        Severity::Low,
        6,
    ),
    (
        "assumed_fields",
        "assumes audit columns that do not exist",
        r"created_at|updated_at|status|active|enabled|deleted_at",
        Severity::Low,
        8,
    ),
];

/// The built-in rule table, in evaluation order.
pub fn default_rules() -> Vec<PatternRule> {
    DEFAULT_RULES
        .iter()
        .map(|&(name, description, pattern, severity, points)| {
            PatternRule::new(name, description, pattern, severity, points)
        })
        .collect()
}
