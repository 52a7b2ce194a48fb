// Copyright (C) 2025 Monarch Contributors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Kicks off the Pest parser for the console command grammar and converts
//! the parse tree into a typed `Command`. Component A (§4.1).

use std::collections::BTreeMap;

use monarch_debug_common::{DimSelector, RankSelector};
use pest::iterators::Pair;
pub use pest::Parser as PestParser;

pub mod console {
    #[derive(pest_derive::Parser)]
    #[grammar = "grammar.pest"]
    pub struct ConsoleParser;
}

use console::{ConsoleParser, Rule};

/// One parsed console line (§4.1). A parse failure is represented by
/// `parse` returning `None`, not by this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Attach { actor_name: String, rank: i64 },
    List,
    Help,
    Quit,
    Continue,
    Cast { actor_name: String, ranks: RankSelector, pdb_command: String },
}

/// Parse one line of console input. Any parse error yields `None`; the
/// caller is responsible for printing a message and staying in the REPL.
pub fn parse(line: &str) -> Option<Command> {
    if line.trim().is_empty() {
        return None;
    }
    let mut pairs = ConsoleParser::parse(Rule::command, line).ok()?;
    let command_pair = pairs.next()?.into_inner().next()?;
    to_command(command_pair)
}

fn to_command(pair: Pair<Rule>) -> Option<Command> {
    match pair.as_rule() {
        Rule::attach => {
            let mut inner = pair.into_inner();
            let actor_name = inner.next()?.as_str().to_string();
            let rank = inner.next()?.as_str().parse().ok()?;
            Some(Command::Attach { actor_name, rank })
        }
        Rule::list => Some(Command::List),
        Rule::help => Some(Command::Help),
        Rule::quit => Some(Command::Quit),
        Rule::cont => Some(Command::Continue),
        Rule::cast => {
            let mut inner = pair.into_inner();
            let actor_name = inner.next()?.as_str().to_string();
            let ranks = to_ranks(inner.next()?)?;
            let pdb_command = inner.next()?.as_str().to_string();
            Some(Command::Cast { actor_name, ranks, pdb_command })
        }
        _ => None,
    }
}

fn to_ranks(pair: Pair<Rule>) -> Option<RankSelector> {
    debug_assert_eq!(pair.as_rule(), Rule::ranks);
    let inner = pair.into_inner().next()?;
    match inner.as_rule() {
        Rule::dims => Some(RankSelector::Dims(to_dims(inner)?)),
        Rule::rank_range => to_range(inner).map(|(start, stop, step)| RankSelector::Range { start, stop, step }),
        Rule::rank_list => Some(RankSelector::List(to_rank_list(inner)?)),
        Rule::int => Some(RankSelector::Single(inner.as_str().parse().ok()?)),
        _ => None,
    }
}

fn to_dims(pair: Pair<Rule>) -> Option<BTreeMap<String, DimSelector>> {
    debug_assert_eq!(pair.as_rule(), Rule::dims);
    let mut map = BTreeMap::new();
    for dim_pair in pair.into_inner() {
        let mut inner = dim_pair.into_inner();
        let name = inner.next()?.as_str().to_string();
        let value_pair = inner.next()?;
        let selector = match value_pair.as_rule() {
            Rule::rank_range => {
                let (start, stop, step) = to_range(value_pair)?;
                DimSelector::Range { start, stop, step }
            }
            Rule::rank_list => DimSelector::List(to_rank_list(value_pair)?),
            Rule::int => DimSelector::Single(value_pair.as_str().parse().ok()?),
            _ => return None,
        };
        map.insert(name, selector);
    }
    Some(map)
}

fn to_range(pair: Pair<Rule>) -> Option<(i64, i64, i64)> {
    debug_assert_eq!(pair.as_rule(), Rule::rank_range);
    let mut inner = pair.into_inner();
    let start = parse_default(inner.next()?, 0)?;
    let stop = parse_default(inner.next()?, i64::MAX)?;
    let step = inner.next().map(|p| parse_default(p, 1)).transpose()?.unwrap_or(1);
    Some((start, stop, step))
}

fn parse_default(pair: Pair<Rule>, default: i64) -> Option<i64> {
    let s = pair.as_str();
    if s.is_empty() {
        Some(default)
    } else {
        s.parse().ok()
    }
}

fn to_rank_list(pair: Pair<Rule>) -> Option<Vec<i64>> {
    debug_assert_eq!(pair.as_rule(), Rule::rank_list);
    pair.into_inner().map(|p| p.as_str().parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_parser_accept() {
        let cmd = parse("cast debugee ranks(dim1=123, dim2=(12,34,56), dim3=15::2) up 2").unwrap();
        let mut dims = BTreeMap::new();
        dims.insert("dim1".to_string(), DimSelector::Single(123));
        dims.insert("dim2".to_string(), DimSelector::List(vec![12, 34, 56]));
        dims.insert("dim3".to_string(), DimSelector::Range { start: 15, stop: i64::MAX, step: 2 });
        assert_eq!(
            cmd,
            Command::Cast {
                actor_name: "debugee".to_string(),
                ranks: RankSelector::Dims(dims),
                pdb_command: "up 2".to_string(),
            }
        );
    }

    #[test]
    fn s2_parser_reject() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("attach"), None);
        assert_eq!(parse("cast actor ranks() b 25"), None);
        assert_eq!(parse("cast actor ranks(:::) b 25"), None);
    }

    #[test]
    fn attach_short_and_long_form() {
        assert_eq!(parse("a debugee 3"), Some(Command::Attach { actor_name: "debugee".to_string(), rank: 3 }));
        assert_eq!(parse("attach debugee 3"), Some(Command::Attach { actor_name: "debugee".to_string(), rank: 3 }));
    }

    #[test]
    fn single_letter_aliases() {
        assert_eq!(parse("l"), Some(Command::List));
        assert_eq!(parse("h"), Some(Command::Help));
        assert_eq!(parse("q"), Some(Command::Quit));
        assert_eq!(parse("c"), Some(Command::Continue));
    }

    #[test]
    fn cast_with_bare_rank_list() {
        let cmd = parse("cast debugee ranks(0,3) n").unwrap();
        assert_eq!(
            cmd,
            Command::Cast {
                actor_name: "debugee".to_string(),
                ranks: RankSelector::List(vec![0, 3]),
                pdb_command: "n".to_string(),
            }
        );
    }

    #[test]
    fn cast_with_single_rank() {
        let cmd = parse("cast debugee ranks(1) up").unwrap();
        assert_eq!(
            cmd,
            Command::Cast {
                actor_name: "debugee".to_string(),
                ranks: RankSelector::Single(1),
                pdb_command: "up".to_string(),
            }
        );
    }
}
