//! Loaders for the three plain-text input files.
//!
//! * `bracket_params.txt`: winners size, losers size, then blank-line
//!   separated sections (routing table, fixed winners, fixed losers, fixed
//!   grand finals). The routing section is left out for a 2-entrant bracket.
//! * `player_data.txt`: whitespace separated `name rating rd` triples.
//! * `initial_bracket.txt`: winners entrants one per line, a blank line,
//!   then losers entrants.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::bracket::{BracketParams, Seeding};
use crate::competitor::Roster;
use crate::error::{BracketError, Result};
use crate::fixed_results::FixedResults;

pub const BRACKET_PARAMS_FILE: &str = "bracket_params.txt";
pub const PLAYER_DATA_FILE: &str = "player_data.txt";
pub const INITIAL_BRACKET_FILE: &str = "initial_bracket.txt";

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| BracketError::MissingInput {
        path: path.to_path_buf(),
        source,
    })
}

fn file_label(path: &Path) -> String {
    path.display().to_string()
}

fn parse_error(file: &str, line: usize, message: impl Into<String>) -> BracketError {
    BracketError::Parse {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}

fn parse_token<T: FromStr>(file: &str, line: usize, token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| parse_error(file, line, format!("invalid {} \"{}\"", what, token)))
}

pub fn load_bracket_params(path: &Path) -> Result<BracketParams> {
    parse_bracket_params(&read_input(path)?, &file_label(path))
}

pub fn load_roster(path: &Path) -> Result<Roster> {
    parse_roster(&read_input(path)?, &file_label(path))
}

pub fn load_seeding(path: &Path) -> Result<Seeding> {
    parse_seeding(&read_input(path)?, &file_label(path))
}

/// A run of non-blank lines, with the 1-based number of each line.
type Section<'a> = Vec<(usize, &'a str)>;

fn sections<'a>(lines: impl Iterator<Item = (usize, &'a str)>) -> Vec<Section<'a>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (number, line) in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push((number, line));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn int_rows<T: FromStr>(file: &str, section: &Section<'_>, what: &str) -> Result<Vec<Vec<T>>> {
    section
        .iter()
        .map(|&(number, line)| {
            line.split_whitespace()
                .map(|token| parse_token(file, number, token, what))
                .collect::<Result<Vec<T>>>()
        })
        .collect()
}

pub fn parse_bracket_params(text: &str, file: &str) -> Result<BracketParams> {
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line));

    let mut size = |what: &str| -> Result<usize> {
        let (number, line) = lines
            .next()
            .ok_or_else(|| parse_error(file, 0, format!("missing {}", what)))?;
        parse_token(file, number, line.trim(), what)
    };
    let winners_size = size("winners bracket size")?;
    let losers_size = size("losers bracket size")?;
    if winners_size < 2 || !winners_size.is_power_of_two() {
        return Err(BracketError::WinnersSizeNotPowerOfTwo(winners_size));
    }

    let mut blocks = sections(lines);
    let routed_tiers = winners_size.trailing_zeros() as usize - 1;
    if routed_tiers == 0 && blocks.len() == 3 {
        blocks.insert(0, Vec::new());
    }
    if blocks.len() != 4 {
        return Err(parse_error(
            file,
            0,
            format!(
                "expected routing, winners, losers and grand finals sections, found {} sections",
                blocks.len()
            ),
        ));
    }

    let wl_map = int_rows(file, &blocks[0], "routing index")?;
    let fixed = FixedResults {
        winners: int_rows(file, &blocks[1], "fixed result")?,
        losers: int_rows(file, &blocks[2], "fixed result")?,
        grands: int_rows(file, &blocks[3], "fixed result")?,
    };
    Ok(BracketParams {
        winners_size,
        losers_size,
        wl_map,
        fixed,
    })
}

pub fn parse_roster(text: &str, file: &str) -> Result<Roster> {
    let tokens: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)))
        .collect();
    if tokens.len() % 3 != 0 {
        let line = tokens.last().map_or(0, |&(n, _)| n);
        return Err(parse_error(file, line, "expected name, rating and RD for every player"));
    }

    let mut entries = Vec::with_capacity(tokens.len() / 3);
    for chunk in tokens.chunks(3) {
        let (line, name) = chunk[0];
        let rating: f64 = parse_token(file, chunk[1].0, chunk[1].1, "rating")?;
        let rd: f64 = parse_token(file, chunk[2].0, chunk[2].1, "RD")?;
        if rd < 0.0 {
            return Err(parse_error(file, line, format!("RD of \"{}\" is negative", name)));
        }
        entries.push((name, rating, rd));
    }
    Roster::from_entries(entries)
}

pub fn parse_seeding(text: &str, file: &str) -> Result<Seeding> {
    let mut lines = text.lines().map(str::trim);
    let winners: Vec<String> = lines
        .by_ref()
        .take_while(|line| !line.is_empty())
        .map(String::from)
        .collect();
    let losers: Vec<String> = lines
        .take_while(|line| !line.is_empty())
        .map(String::from)
        .collect();
    if winners.is_empty() {
        return Err(parse_error(file, 1, "no winners bracket entrants"));
    }
    Ok(Seeding { winners, losers })
}
