/// Ballot validation against the configured roster
use crate::error::{LedgerError, Result};
use crate::roster::{Role, Roster};
use crate::vote::types::Ballot;
use serde_json::{Map, Value};

/// Check a raw candidate selection and turn it into a [`Ballot`].
///
/// Checks run in a fixed order and the first failure is returned: every role
/// must be present (Mayor, Vice Mayor, Councilor), the single-seat picks must
/// be on the roster, then Councilor must be a list of roster members.
pub fn validate_ballot(selection: &Map<String, Value>, roster: &Roster) -> Result<Ballot> {
    for role in Role::ALL {
        if !selection.contains_key(role.as_str()) {
            return Err(LedgerError::MissingRole(role));
        }
    }

    let mayor = single_seat_pick(selection, Role::Mayor, roster)?;
    let vice_mayor = single_seat_pick(selection, Role::ViceMayor, roster)?;

    let councilor = match selection.get(Role::Councilor.as_str()) {
        Some(Value::Array(entries)) => entries,
        _ => return Err(LedgerError::CouncilorNotList),
    };

    let mut picks = Vec::with_capacity(councilor.len());
    for entry in councilor {
        match entry.as_str() {
            Some(name) if roster.contains(Role::Councilor, name) => picks.push(name.to_string()),
            _ => return Err(LedgerError::InvalidCouncilor(display_pick(entry))),
        }
    }

    Ok(Ballot {
        mayor,
        vice_mayor,
        councilor: picks,
    })
}

fn single_seat_pick(selection: &Map<String, Value>, role: Role, roster: &Roster) -> Result<String> {
    let value = selection.get(role.as_str()).unwrap_or(&Value::Null);
    match value.as_str() {
        Some(name) if roster.contains(role, name) => Ok(name.to_string()),
        _ => Err(LedgerError::InvalidCandidate {
            role,
            candidate: display_pick(value),
        }),
    }
}

/// Strings are shown bare; any other JSON value is shown as JSON.
fn display_pick(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selection(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_ballot() {
        let roster = Roster::default();
        let ballot = validate_ballot(
            &selection(json!({
                "Mayor": "AGDA, DAYAN (PFP)",
                "Vice Mayor": "TIU SONCO, EMMANUEL (LAKAS)",
                "Councilor": ["DAZA, ZEN (PFP)", "GALO, IAN ERVIN (IND)"]
            })),
            &roster,
        )
        .unwrap();

        assert_eq!(ballot.mayor, "AGDA, DAYAN (PFP)");
        assert_eq!(ballot.councilor.len(), 2);
    }

    #[test]
    fn test_empty_councilor_list_is_allowed() {
        let roster = Roster::default();
        let ballot = validate_ballot(
            &selection(json!({
                "Mayor": "PICARDAL, DINDO (IND)",
                "Vice Mayor": "FRANCO, KUYA VIC OHOYY (NPC)",
                "Councilor": []
            })),
            &roster,
        )
        .unwrap();
        assert!(ballot.councilor.is_empty());
    }

    #[test]
    fn test_first_missing_role_is_reported() {
        let roster = Roster::default();
        let err = validate_ballot(&selection(json!({"Councilor": []})), &roster).unwrap_err();
        assert_eq!(err, LedgerError::MissingRole(Role::Mayor));

        let err = validate_ballot(
            &selection(json!({"Mayor": "AGDA, DAYAN (PFP)", "Councilor": []})),
            &roster,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing role: Vice Mayor");
    }

    #[test]
    fn test_missing_role_wins_over_invalid_candidate() {
        let roster = Roster::default();
        let err = validate_ballot(
            &selection(json!({"Mayor": "NOBODY", "Vice Mayor": "NOBODY"})),
            &roster,
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::MissingRole(Role::Councilor));
    }

    #[test]
    fn test_invalid_single_seat_picks() {
        let roster = Roster::default();
        let err = validate_ballot(
            &selection(json!({
                "Mayor": "TIU SONCO, EMMANUEL (LAKAS)",
                "Vice Mayor": "TIU SONCO, EMMANUEL (LAKAS)",
                "Councilor": []
            })),
            &roster,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Mayor candidate: TIU SONCO, EMMANUEL (LAKAS)"
        );

        let err = validate_ballot(
            &selection(json!({
                "Mayor": "AGDA, DAYAN (PFP)",
                "Vice Mayor": 7,
                "Councilor": []
            })),
            &roster,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Vice Mayor candidate: 7");
    }

    #[test]
    fn test_councilor_checks() {
        let roster = Roster::default();
        let err = validate_ballot(
            &selection(json!({
                "Mayor": "AGDA, DAYAN (PFP)",
                "Vice Mayor": "TIU SONCO, EMMANUEL (LAKAS)",
                "Councilor": "DAZA, ZEN (PFP)"
            })),
            &roster,
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::CouncilorNotList);

        let err = validate_ballot(
            &selection(json!({
                "Mayor": "AGDA, DAYAN (PFP)",
                "Vice Mayor": "TIU SONCO, EMMANUEL (LAKAS)",
                "Councilor": ["DAZA, ZEN (PFP)", "SOMEONE ELSE", "ALSO WRONG"]
            })),
            &roster,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Councilor: SOMEONE ELSE");
    }
}
