//! Roster files on disk driving a game-mode rotation

use std::io::Write;
use walkup_cli::{CliError, Roster};
use walkup_core::{GameSession, SegmentPolicy};

fn write_roster(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_roster_file_drives_game_session() {
    let file = write_roster(
        r#"{
            "players": [
                { "id": "p1", "name": "Avery" },
                { "id": "p2", "name": "Blake" },
                { "id": "p3", "name": "Casey" }
            ]
        }"#,
    );

    let roster = Roster::load(file.path(), &SegmentPolicy::default()).unwrap();
    let mut game = GameSession::new();
    game.start(roster.order(2).unwrap());

    assert_eq!(game.current_batter(&roster.players).unwrap().name, "Casey");
    assert_eq!(game.on_deck(&roster.players).unwrap().name, "Avery");
    assert_eq!(game.in_the_hole(&roster.players).unwrap().name, "Blake");

    game.advance();
    assert_eq!(game.current_batter(&roster.players).unwrap().name, "Avery");
}

#[test]
fn test_missing_roster_file() {
    let result = Roster::load(
        std::path::Path::new("/nonexistent/roster.json"),
        &SegmentPolicy::default(),
    );
    assert!(matches!(result, Err(CliError::Io(_))));
}

#[test]
fn test_malformed_roster_file() {
    let file = write_roster("{ not json");
    let result = Roster::load(file.path(), &SegmentPolicy::default());
    assert!(matches!(result, Err(CliError::Json(_))));
}
