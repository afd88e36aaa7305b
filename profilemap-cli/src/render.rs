use profilemap_lib::{MapDisplay, MapTarget, Profile};
use std::io::{self, Write};

const MAP_ZOOM: u8 = 13;

pub fn cards<W: Write>(out: &mut W, profiles: &[Profile]) -> io::Result<()> {
    if profiles.is_empty() {
        return writeln!(out, "No profiles found.");
    }
    for profile in profiles {
        writeln!(out, "{}  [{}]", profile.name, profile.id)?;
        if !profile.address.formatted.is_empty() {
            writeln!(out, "  {}", profile.address.formatted)?;
        }
        if !profile.description.is_empty() {
            writeln!(out, "  {}", profile.description)?;
        }
        if !profile.interests.is_empty() {
            writeln!(out, "  Interests: {}", profile.interests.join(", "))?;
        }
    }
    Ok(())
}

pub fn details<W: Write>(out: &mut W, profile: &Profile) -> io::Result<()> {
    writeln!(out, "{}", profile.name)?;
    writeln!(out, "Photo: {}", profile.photo)?;
    if !profile.description.is_empty() {
        writeln!(out, "{}", profile.description)?;
    }
    writeln!(out, "Contact: {}", profile.contact)?;
    writeln!(out, "Location: {}", profile.address.formatted)?;
    writeln!(
        out,
        "Coordinates: {}, {}",
        profile.address.lat, profile.address.lng
    )?;
    writeln!(out, "Interests:")?;
    for interest in &profile.interests {
        writeln!(out, "  - {interest}")?;
    }
    Ok(())
}

pub fn locations<W: Write>(out: &mut W, locations: &[String]) -> io::Result<()> {
    for location in locations {
        if location.is_empty() {
            writeln!(out, "(no location)")?;
        } else {
            writeln!(out, "{location}")?;
        }
    }
    Ok(())
}

/// Prints the target and an OpenStreetMap link instead of drawing tiles.
pub struct TerminalMap<W: Write> {
    out: W,
}

impl<W: Write> TerminalMap<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> MapDisplay for TerminalMap<W> {
    type Error = io::Error;

    fn display(&mut self, target: &MapTarget) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "{}'s Location", target.label)?;
        if !target.formatted.is_empty() {
            writeln!(out, "  {}", target.formatted)?;
        }
        writeln!(out, "  {}, {}", target.lat, target.lng)?;
        writeln!(
            out,
            "  https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map={MAP_ZOOM}/{lat}/{lng}",
            lat = target.lat,
            lng = target.lng,
        )?;
        out.flush()
    }
}
