use std::io::Cursor;

use chrono::NaiveDate;

use super::common::*;
use crate::workflows::raffle::{
    write_attendance_csv, write_groups_csv, write_rosters_csv, AllocationEngine, LevelId,
    MemberRegistry, PreviousCycle, RaffleRunOptions, RaffleService, RaffleSummary, Role,
};

#[test]
fn summary_counts_levels_and_collects_emails() {
    let catalog = catalog_of(&[("S1", 1), ("B1", 2)]);
    let registrants = build_all(
        &catalog,
        vec![
            leader("@ana").wants(&["S1"]),
            leader("@ben").wants(&["S1"]).previous(),
            follower("@cleo").wants(&["S1"]),
            leader("@dan").wants(&["B1"]),
        ],
    );
    let result = AllocationEngine::new(catalog).allocate(&registrants);

    let summary = RaffleSummary::from_result(&result);

    assert_eq!(summary.total, 4);
    assert_eq!(summary.seated, 2);
    assert_eq!(summary.waitlisted, 2);
    assert_eq!(summary.levels[0].leaders, 1);
    assert_eq!(summary.levels[0].open_seats(), 0);
    assert_eq!(summary.levels[1].open_seats(), 2);
    assert_eq!(summary.waiting_lists[0].role, Role::Leader);
    assert_eq!(summary.waiting_lists[0].waiting, 2);
    assert_eq!(summary.waiting_lists[0].from_previous_waiting_list, 0);
    assert_eq!(
        summary.accepted_emails,
        vec!["ben@example.com", "cleo@example.com"]
    );
    assert_eq!(
        summary.waitlisted_emails,
        vec!["ana@example.com", "dan@example.com"]
    );
}

#[test]
fn groups_export_feeds_the_next_cycle() {
    let catalog = catalog_of(&[("S1", 1)]);
    let registrants = build_all(
        &catalog,
        vec![
            leader("@seated").wants(&["S1"]),
            leader("@unlucky").wants(&["S1"]),
            leader("@tardy").wants(&["S1"]).late(),
            follower("@partner").wants(&["S1"]),
        ],
    );
    let result = AllocationEngine::new(catalog).allocate(&registrants);

    let mut groups = Vec::new();
    write_groups_csv(&registrants, &result, &mut groups).expect("groups csv");
    let text = String::from_utf8(groups.clone()).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("handle,name,email,role,placement,position,previous_waiting_list,late_registration")
    );
    assert_eq!(
        lines.next(),
        Some("@seated,seated,seated@example.com,Leader,S1,1,false,false")
    );
    assert_eq!(
        lines.next(),
        Some("@unlucky,unlucky,unlucky@example.com,Leader,waiting_list,1,false,false")
    );

    let previous = PreviousCycle::from_reader(Cursor::new(groups)).expect("history");
    assert!(previous.qualifies("@unlucky"));
    assert!(!previous.qualifies("@tardy"));
    assert!(!previous.qualifies("@seated"));
    assert_eq!(previous.len(), 1);
}

#[test]
fn rosters_export_lists_seats_per_level_and_role() {
    let catalog = catalog_of(&[("S1", 2)]);
    let registrants = build_all(
        &catalog,
        vec![
            leader("@ana").wants(&["S1"]).member(true),
            follower("@cleo").wants(&["S1"]),
        ],
    );
    let result = AllocationEngine::new(catalog).allocate(&registrants);

    let mut rosters = Vec::new();
    write_rosters_csv(&result, &mut rosters).expect("rosters csv");
    let text = String::from_utf8(rosters).expect("utf8");

    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "level,level_name,role,seat,name,handle,member,paid",
            "S1,Level S1,Leader,1,ana,@ana,true,true",
            "S1,Level S1,Follower,1,cleo,@cleo,false,false",
        ]
    );
}

#[test]
fn attendance_sheet_has_a_section_per_level_and_role() {
    let catalog = catalog_of(&[("S1", 2), ("B1", 1)]);
    let registrants = build_all(
        &catalog,
        vec![
            leader("@ana").wants(&["S1"]).member(false),
            leader("@ben").wants(&["S1"]),
            follower("@cleo").wants(&["S1"]).member(true),
            follower("@dia").wants(&["S1"]),
            leader("@eli").wants(&["B1"]),
            follower("@fay").wants(&["B1"]),
        ],
    );
    let result = AllocationEngine::new(catalog).allocate(&registrants);

    let mut attendance = Vec::new();
    write_attendance_csv(&result, &mut attendance).expect("attendance csv");
    let text = String::from_utf8(attendance).expect("utf8");

    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "level,level_name,role,name,handle,member,paid,week_1,week_2,week_3,week_4",
            "S1,Level S1,Leader,ana,@ana,true,false,,,,",
            "S1,Level S1,Leader,ben,@ben,false,false,,,,",
            "S1,Level S1,Follower,cleo,@cleo,true,true,,,,",
            "S1,Level S1,Follower,dia,@dia,false,false,,,,",
            "B1,Level B1,Leader,eli,@eli,false,false,,,,",
            "B1,Level B1,Follower,fay,@fay,false,false,,,,",
        ]
    );
}

#[test]
fn service_applies_the_members_list() {
    let csv = format!(
        "{FORM_HEADER}\
2025-08-30 09:00:00,@Lead,Lead,lead@example.com,Leader,Salsa Level 1,No,\n\
2025-08-30 09:05:00,@follow,Follow,follow@example.com,Follower,Salsa Level 1,No,\n"
    );
    let members = MemberRegistry::from_reader(Cursor::new("handle,approved,paid\n@lead,yes,yes\n"))
        .expect("members");
    let service = RaffleService::new(catalog_of(&[("S1", 1)]));

    let run = service
        .run(
            Cursor::new(csv),
            RaffleRunOptions {
                members: Some(members),
                ..RaffleRunOptions::default()
            },
        )
        .expect("run succeeds");

    let roster = run.result.roster(&LevelId::new("S1")).expect("S1");
    assert!(roster.leaders[0].identity.membership.member);
    assert!(roster.leaders[0].identity.membership.paid);
    assert!(!roster.followers[0].identity.membership.member);
}

#[test]
fn service_marks_rows_after_the_cutoff_as_late() {
    let csv = format!(
        "{FORM_HEADER}\
2025-09-02 09:00:00,@late-lead,Late Lead,late@example.com,Leader,Salsa Level 1,No,\n\
2025-08-30 09:00:00,@lead,Lead,lead@example.com,Leader,Salsa Level 1,No,\n\
2025-08-30 09:05:00,@follow,Follow,follow@example.com,Follower,Salsa Level 1,No,\n"
    );
    let service = RaffleService::new(catalog_of(&[("S1", 1)]));
    let cutoff = NaiveDate::from_ymd_opt(2025, 9, 1)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid cutoff");

    let run = service
        .run(
            Cursor::new(csv),
            RaffleRunOptions {
                cutoff: Some(cutoff),
                previous: None,
                members: None,
            },
        )
        .expect("run succeeds");

    assert!(run.registrants[0].is_late_registration());
    assert_eq!(seated_handles(&run.result, "S1", Role::Leader), vec!["@lead"]);
    assert_eq!(run.summary.waitlisted_emails, vec!["late@example.com"]);
}

#[test]
fn service_applies_previous_cycle_history() {
    let csv = format!(
        "{FORM_HEADER}\
2025-08-30 09:00:00,@first,First,first@example.com,Follower,Salsa Level 1,No,\n\
2025-08-30 09:10:00,@Returning,Returning,returning@example.com,Follower,Salsa Level 1,No,\n\
2025-08-30 09:20:00,@lead,Lead,lead@example.com,Leader,Salsa Level 1,No,\n"
    );
    let service = RaffleService::new(catalog_of(&[("S1", 1)]));

    let run = service
        .run(
            Cursor::new(csv),
            RaffleRunOptions {
                cutoff: None,
                previous: Some(PreviousCycle::from_handles(["@returning"])),
                members: None,
            },
        )
        .expect("run succeeds");

    assert!(run.registrants[1].was_on_previous_waiting_list());
    assert_eq!(
        seated_handles(&run.result, "S1", Role::Follower),
        vec!["@returning"]
    );
    assert_eq!(waiting_handles(&run.result, Role::Follower), vec!["@first"]);
}
