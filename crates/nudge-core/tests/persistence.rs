use std::fs;

use tempfile::TempDir;

use nudge_core::commands::Session;
use nudge_core::layout::render_box;
use nudge_core::settings::Settings;
use nudge_core::store::{LoadOutcome, Store};
use nudge_core::width::display_width;

#[test]
fn two_shells_share_one_file() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tasks.save");
    let mut left = Session::open(Store::new(&path, Settings::default()));
    let mut right = Session::open(Store::new(&path, Settings::default()));

    assert!(left.add("from the left shell").ok);
    assert!(right.add("from the right shell").ok);
    assert!(left.config_set("title", "SHARED").ok);

    right.refresh();
    let texts: Vec<&str> = right.tasks().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["from the left shell", "from the right shell"]);
    assert_eq!(right.settings().title, "SHARED");
}

#[test]
fn render_after_reload_matches_saved_state() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tasks.save");
    {
        let mut session = Session::open(Store::new(&path, Settings::default()));
        session.config_apply_preset("subtle");
        session.add("review pull requests before lunch");
        session.add("reply to the landlord");
    }

    let mut store = Store::new(&path, Settings::default());
    let loaded = store.load();
    assert_eq!(loaded.outcome, LoadOutcome::Loaded);
    assert_eq!(loaded.settings.border_color, 238);
    let lines = render_box(&loaded.tasks, &loaded.settings, 120, "Breathe").expect("rendered");
    assert!(lines.iter().all(|line| display_width(line) == 120));
}

#[test]
fn hand_edited_file_with_missing_colors_is_repaired() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tasks.save");
    fs::write(&path, "one\u{1f}two\n\n0\ntask-colors=4,5\n").expect("write");

    let mut store = Store::new(&path, Settings::default());
    let loaded = store.load();
    assert_eq!(loaded.outcome, LoadOutcome::Regenerated);
    let colors: Vec<u8> = loaded.tasks.iter().map(|t| t.color).collect();
    assert_eq!(colors, vec![4, 5]);

    let raw = fs::read_to_string(&path).expect("read");
    assert_eq!(raw, "one\u{1f}two\n4\u{1f}5\n0\ntask-colors=4,5\n");
}

#[test]
fn session_reports_reset_of_unrecognized_file() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tasks.save");
    fs::write(&path, "just one line of notes\n").expect("write");

    let session = Session::open(Store::new(&path, Settings::default()));
    let LoadOutcome::Reset { backup } = session.last_load() else {
        panic!("expected reset, got {:?}", session.last_load());
    };
    assert_eq!(
        fs::read_to_string(backup).expect("backup"),
        "just one line of notes\n"
    );
    assert!(session.tasks().is_empty());
    assert_eq!(session.store().path(), path.as_path());
}

#[test]
fn explicit_choice_outlives_the_environment_value_it_matched() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tasks.save");
    let with_env =
        Settings::default().with_env(|name| (name == "NUDGE_TITLE").then(|| "WORK".to_string()));
    {
        let mut session = Session::open(Store::new(&path, with_env));
        assert!(session.config_set("title", "HOME").ok);
        assert!(session.config_set("title", "WORK").ok);
        assert!(session.hide().ok);
    }

    let session = Session::open(Store::new(&path, Settings::default()));
    assert_eq!(session.settings().title, "WORK");
    assert!(!session.settings().show_box);
    assert!(!session.settings().show_affirmation);
}

#[test]
fn mutations_refuse_to_replace_an_unreadable_file() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("tasks.save");
    fs::create_dir(&path).expect("dir in the way");
    fs::write(path.join("notes"), "keep me").expect("write");

    let mut session = Session::open(Store::new(&path, Settings::default()));
    assert_eq!(session.last_load(), &LoadOutcome::Unreadable);
    let outcome = session.add("buy milk");
    assert!(!outcome.ok);
    assert!(outcome.message.contains("Refusing to overwrite"));
    assert!(!session.config_set("title", "X").ok);
    assert_eq!(fs::read_to_string(path.join("notes")).expect("read"), "keep me");
}
