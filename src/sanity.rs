use crate::errors::ProvError;
use crate::utils::shell::in_path;

/// Fails before anything runs if one of `programs` is not in `$PATH`
pub fn check_commands(programs: &[&str]) -> Result<(), ProvError> {
    let missing: Vec<&str> = programs
        .iter()
        .copied()
        .filter(|program| !in_path(program))
        .collect();

    if !missing.is_empty() {
        return Err(ProvError::MissingCommands(missing.join(", ")));
    }

    Ok(())
}

#[test]
fn test_check_commands() {
    assert!(check_commands(&["sh"]).is_ok());

    match check_commands(&["sh", "cryptprov-no-such-program"]) {
        Err(ProvError::MissingCommands(missing)) => assert_eq!("cryptprov-no-such-program", missing),
        result => panic!("unexpected result {result:?}"),
    }
}
