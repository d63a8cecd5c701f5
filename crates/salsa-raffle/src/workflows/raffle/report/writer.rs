use crate::workflows::raffle::allocation::AllocationResult;
use crate::workflows::raffle::domain::{Registrant, Role};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct GroupsRecord<'a> {
    handle: &'a str,
    name: &'a str,
    email: &'a str,
    role: &'static str,
    placement: String,
    position: usize,
    previous_waiting_list: bool,
    late_registration: bool,
}

#[derive(Debug, Serialize)]
struct RosterRecord<'a> {
    level: &'a str,
    level_name: &'a str,
    role: &'static str,
    seat: usize,
    name: &'a str,
    handle: &'a str,
    member: bool,
    paid: bool,
}

#[derive(Debug, Serialize)]
struct AttendanceRecord<'a> {
    level: &'a str,
    level_name: &'a str,
    role: &'static str,
    name: &'a str,
    handle: &'a str,
    member: bool,
    paid: bool,
    week_1: &'static str,
    week_2: &'static str,
    week_3: &'static str,
    week_4: &'static str,
}

/// One row per registrant in input order. This is also the file the next
/// cycle reads back as its previous-cycle history.
pub fn write_groups_csv<W: Write>(
    registrants: &[Registrant],
    result: &AllocationResult,
    writer: W,
) -> Result<(), csv::Error> {
    let placements = result.placements();
    let mut csv_writer = csv::Writer::from_writer(writer);

    for (position, registrant) in registrants.iter().enumerate() {
        let (placement, number) = match placements.get(position).cloned().flatten() {
            Some(placement) => (placement.label(), placement.number()),
            None => (String::new(), 0),
        };

        let identity = registrant.identity();
        csv_writer.serialize(GroupsRecord {
            handle: &identity.handle,
            name: &identity.name,
            email: &identity.email,
            role: registrant.role().label(),
            placement,
            position: number,
            previous_waiting_list: registrant.was_on_previous_waiting_list(),
            late_registration: registrant.is_late_registration(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Seat lists per level and role, in seating order.
pub fn write_rosters_csv<W: Write>(result: &AllocationResult, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for roster in &result.levels {
        for role in Role::ordered() {
            for seat in roster.seats(role) {
                csv_writer.serialize(RosterRecord {
                    level: roster.level.as_str(),
                    level_name: &roster.name,
                    role: role.label(),
                    seat: seat.seat,
                    name: &seat.identity.name,
                    handle: &seat.identity.handle,
                    member: seat.identity.membership.member,
                    paid: seat.identity.membership.paid,
                })?;
            }
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Attendance sheet for teachers: one section per level and role in seating
/// order, with blank columns for the four weeks of the cycle.
pub fn write_attendance_csv<W: Write>(result: &AllocationResult, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for roster in &result.levels {
        for role in Role::ordered() {
            for seat in roster.seats(role) {
                csv_writer.serialize(AttendanceRecord {
                    level: roster.level.as_str(),
                    level_name: &roster.name,
                    role: role.label(),
                    name: &seat.identity.name,
                    handle: &seat.identity.handle,
                    member: seat.identity.membership.member,
                    paid: seat.identity.membership.paid,
                    week_1: "",
                    week_2: "",
                    week_3: "",
                    week_4: "",
                })?;
            }
        }
    }

    csv_writer.flush()?;
    Ok(())
}
