//! Rule-file parser. Each non-empty line is `NAME PATTERN`; `PATTERN` is parsed with `nom`
//! combinators (`alt`/`many1`/postfix-kleene composition) over code points, ranges, sets, and
//! the escape table this generator's rules language needs. Patterns are first parsed into a
//! plain [RawRegex] tree (no arena access needed mid-parse), then lowered into the run's
//! [AstArena] once parsing succeeds.

use std::rc::Rc;

use nom::branch::alt;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{anychar, char};
use nom::combinator::{all_consuming, map, opt, value, verify};
use nom::multi::{many0, many1, separated_list1};
use nom::sequence::preceded;
use nom::IResult;

use crate::ast::{AstArena, AstId, AstNode};
use crate::cp::Range;
use crate::error::RuleSyntaxError;
use crate::unicode_classes;

/// A parsed rule: a name and the arena index of its pattern's root.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: Rc<str>,
    pub root: AstId,
}

/// Every rule parsed from a rules file, and the arena their ASTs live in.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub arena: AstArena,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Every boundary point (each literal character's `c`/`c + 1`, each `Set` range's `lo`/`hi`)
    /// mentioned anywhere across every rule, for [crate::cp::Alphabet::partition].
    pub fn boundary_points(&self) -> Vec<u32> {
        let mut out = Vec::new();
        for rule in &self.rules {
            collect_boundaries(&self.arena, rule.root, &mut out);
        }
        out
    }
}

fn collect_boundaries(arena: &AstArena, id: AstId, out: &mut Vec<u32>) {
    match arena.get(id) {
        AstNode::Set { ranges, .. } => {
            for r in ranges {
                out.push(r.lo);
                out.push(r.hi);
            }
        }
        AstNode::Cat(children) | AstNode::Alt(children) => {
            for &child in children {
                collect_boundaries(arena, child, out);
            }
        }
        AstNode::Rep { child, .. } => collect_boundaries(arena, *child, out),
    }
}

/// Parses a complete rules file: one `NAME PATTERN` per non-empty line.
pub fn read_rules(src: &str) -> Result<RuleSet, RuleSyntaxError> {
    let mut arena = AstArena::new();
    let mut rules = Vec::new();

    for (zero_based_line, line) in src.lines().enumerate() {
        let line_no = zero_based_line + 1;
        if line.trim().is_empty() {
            continue;
        }
        let (name, pattern) = split_name_pattern(line, line_no)?;
        let raw = parse_pattern(pattern)
            .map_err(|e| to_rule_syntax_error(line, pattern, line_no, e))?;
        let root = lower(&mut arena, &raw);
        rules.push(Rule {
            name: Rc::from(name),
            root,
        });
    }

    Ok(RuleSet { arena, rules })
}

fn split_name_pattern(line: &str, line_no: usize) -> Result<(&str, &str), RuleSyntaxError> {
    let name_start = line
        .find(|c: char| !c.is_whitespace())
        .expect("blank lines are skipped by the caller");
    let rest = &line[name_start..];

    let space_idx = rest.find(char::is_whitespace).ok_or_else(|| {
        RuleSyntaxError::new(
            line_no,
            name_start + 1,
            "rule line is missing a pattern (expected `NAME PATTERN`)",
        )
    })?;
    let name = &rest[..space_idx];
    validate_name(name, line_no, name_start + 1)?;

    let after_space = &rest[space_idx..];
    let pattern_offset = after_space.find(|c: char| !c.is_whitespace()).ok_or_else(|| {
        RuleSyntaxError::new(
            line_no,
            name_start + space_idx + 1,
            "rule line is missing a pattern",
        )
    })?;
    let pattern = &after_space[pattern_offset..];
    Ok((name, pattern))
}

fn validate_name(name: &str, line_no: usize, col: usize) -> Result<(), RuleSyntaxError> {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_uppercase());
    let rest_ok = chars.all(|c| c == '_' || c.is_ascii_uppercase() || c.is_ascii_digit());
    if first_ok && rest_ok {
        Ok(())
    } else {
        Err(RuleSyntaxError::new(
            line_no,
            col,
            format!("rule name `{name}` must match [A-Z_][A-Z0-9_]*"),
        ))
    }
}

fn to_rule_syntax_error(
    line: &str,
    pattern: &str,
    line_no: usize,
    err: PatternError<'_>,
) -> RuleSyntaxError {
    let pattern_offset_in_line = pattern.as_ptr() as usize - line.as_ptr() as usize;
    let error_offset_in_pattern = err.input.as_ptr() as usize - pattern.as_ptr() as usize;
    let col = pattern_offset_in_line + error_offset_in_pattern + 1;
    let message = err
        .message
        .unwrap_or_else(|| "invalid pattern syntax".to_string());
    RuleSyntaxError::new(line_no, col, message)
}

/// An intermediate regex tree, parsed before arena allocation, keeping parsing and NFA
/// construction decoupled.
#[derive(Debug, Clone)]
enum RawRegex {
    Set { ranges: Vec<Range>, negated: bool },
    Cat(Vec<RawRegex>),
    Alt(Vec<RawRegex>),
    Rep { child: Box<RawRegex>, accept_empty: bool },
}

fn cp_set(cp: u32) -> RawRegex {
    RawRegex::Set {
        ranges: vec![Range::single(cp)],
        negated: false,
    }
}

fn lower(arena: &mut AstArena, raw: &RawRegex) -> AstId {
    match raw {
        RawRegex::Set { ranges, negated } => arena.alloc(AstNode::Set {
            ranges: ranges.clone(),
            negated: *negated,
        }),
        RawRegex::Cat(children) => {
            let ids = children.iter().map(|c| lower(arena, c)).collect();
            arena.alloc(AstNode::Cat(ids))
        }
        RawRegex::Alt(children) => {
            let ids = children.iter().map(|c| lower(arena, c)).collect();
            arena.alloc(AstNode::Alt(ids))
        }
        RawRegex::Rep {
            child,
            accept_empty,
        } => {
            let child_id = lower(arena, child);
            arena.alloc(AstNode::Rep {
                child: child_id,
                accept_empty: *accept_empty,
            })
        }
    }
}

#[derive(Debug)]
struct PatternError<'a> {
    input: &'a str,
    message: Option<String>,
}

impl<'a> PatternError<'a> {
    fn msg(input: &'a str, message: impl Into<String>) -> Self {
        Self {
            input,
            message: Some(message.into()),
        }
    }
}

impl<'a> nom::error::ParseError<&'a str> for PatternError<'a> {
    fn from_error_kind(input: &'a str, _kind: nom::error::ErrorKind) -> Self {
        Self {
            input,
            message: None,
        }
    }

    fn append(_input: &'a str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, PatternError<'a>>;

fn parse_pattern(input: &str) -> Result<RawRegex, PatternError<'_>> {
    if input.is_empty() {
        return Err(PatternError::msg(input, "empty pattern"));
    }
    match all_consuming(parse_alternation)(input) {
        Ok((_, raw)) => Ok(raw),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
        Err(nom::Err::Incomplete(_)) => unreachable!("complete parsers never return Incomplete"),
    }
}

fn expect_char<'a>(input: &'a str, c: char, message: &'static str) -> PResult<'a, char> {
    char(c)(input).map_err(|_: nom::Err<PatternError<'a>>| {
        nom::Err::Failure(PatternError::msg(input, message))
    })
}

fn parse_alternation(input: &str) -> PResult<'_, RawRegex> {
    let (input, mut branches) = separated_list1(char('|'), parse_sequence)(input)?;
    if branches.len() == 1 {
        Ok((input, branches.remove(0)))
    } else {
        Ok((input, RawRegex::Alt(branches)))
    }
}

fn parse_sequence(input: &str) -> PResult<'_, RawRegex> {
    let (input, mut atoms) = many1(parse_postfix)(input)?;
    if atoms.len() == 1 {
        Ok((input, atoms.remove(0)))
    } else {
        Ok((input, RawRegex::Cat(atoms)))
    }
}

fn parse_postfix(input: &str) -> PResult<'_, RawRegex> {
    let (input, atom) = parse_atom(input)?;
    let (input, op) = opt(alt((char('*'), char('+'))))(input)?;
    let node = match op {
        Some('*') => RawRegex::Rep {
            child: Box::new(atom),
            accept_empty: true,
        },
        Some('+') => RawRegex::Rep {
            child: Box::new(atom),
            accept_empty: false,
        },
        _ => atom,
    };
    Ok((input, node))
}

fn parse_atom(input: &str) -> PResult<'_, RawRegex> {
    alt((parse_group, parse_set, parse_escape, parse_literal_char))(input)
}

fn parse_literal_char(input: &str) -> PResult<'_, RawRegex> {
    let (input, c) = verify(anychar, |c: &char| !"()[]|*+\\".contains(*c))(input)?;
    Ok((input, cp_set(c as u32)))
}

fn parse_group(input: &str) -> PResult<'_, RawRegex> {
    let (input, _) = char('(')(input)?;
    let (input, inner) = parse_alternation(input)?;
    let (input, _) = expect_char(input, ')', "unmatched `(`")?;
    Ok((input, inner))
}

fn parse_set(input: &str) -> PResult<'_, RawRegex> {
    let (input, _) = char('[')(input)?;
    let (input, negated) = map(opt(char('^')), |o| o.is_some())(input)?;
    // a `-` immediately after the opening bracket (or negation marker) is a literal hyphen,
    // following the common bracket-expression convention rather than the range operator.
    let (input, leading_dash) = opt(char('-'))(input)?;
    let (input, mut items) = many0(parse_set_item)(input)?;
    if leading_dash.is_some() {
        items.insert(0, Range::single('-' as u32));
    }
    // `[]` (matches nothing) and `[^]` (matches everything) are both legal, if useless — the set
    // need not be non-empty.
    let (input, _) = expect_char(input, ']', "unmatched `[`")?;
    Ok((
        input,
        RawRegex::Set {
            ranges: items,
            negated,
        },
    ))
}

fn parse_set_item(input: &str) -> PResult<'_, Range> {
    let (input, lo) = parse_set_codepoint(input)?;
    let (input, hi) = opt(preceded(char('-'), parse_set_codepoint))(input)?;
    match hi {
        Some(hi_cp) if hi_cp < lo => Err(nom::Err::Failure(PatternError::msg(
            input,
            "invalid range: end is before start",
        ))),
        Some(hi_cp) => Ok((input, Range::new(lo, hi_cp + 1))),
        None => Ok((input, Range::single(lo))),
    }
}

fn parse_set_codepoint(input: &str) -> PResult<'_, u32> {
    alt((
        preceded(char('\\'), parse_simple_escape),
        map(
            verify(anychar, |c: &char| *c != ']' && *c != '-' && *c != '\\'),
            |c| c as u32,
        ),
    ))(input)
}

/// `\L`, `\w`, `\d`, `\s`, and the single-codepoint escapes, producing a full [RawRegex::Set].
fn parse_escape(input: &str) -> PResult<'_, RawRegex> {
    let (after_backslash, _) = char('\\')(input)?;
    alt((
        map(parse_simple_escape, cp_set),
        map(char('L'), |_| RawRegex::Set {
            ranges: unicode_classes::letter_ranges().to_vec(),
            negated: false,
        }),
        map(char('w'), |_| RawRegex::Set {
            ranges: unicode_classes::word_ranges(),
            negated: false,
        }),
        map(char('d'), |_| RawRegex::Set {
            ranges: unicode_classes::digit_ranges(),
            negated: false,
        }),
        map(char('s'), |_| RawRegex::Set {
            ranges: unicode_classes::space_ranges(),
            negated: false,
        }),
    ))(after_backslash)
    .map_err(|_| nom::Err::Failure(PatternError::msg(input, "invalid escape sequence")))
}

/// The escapes that reduce to exactly one code point: `\n \r \t \\ \+ \* \[ \]`, `\uXXXX`,
/// `\UXXXXXXXX`. Shared between full-pattern escapes and the escapes allowed inside `[...]`.
fn parse_simple_escape(input: &str) -> PResult<'_, u32> {
    alt((
        value('\n' as u32, char('n')),
        value('\r' as u32, char('r')),
        value('\t' as u32, char('t')),
        value('\\' as u32, char('\\')),
        value('+' as u32, char('+')),
        value('*' as u32, char('*')),
        value('[' as u32, char('[')),
        value(']' as u32, char(']')),
        parse_u_escape,
        parse_big_u_escape,
    ))(input)
}

fn parse_u_escape(input: &str) -> PResult<'_, u32> {
    let (input, _) = char('u')(input)?;
    let (input, digits) = take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit())(input)?;
    Ok((input, u32::from_str_radix(digits, 16).unwrap()))
}

fn parse_big_u_escape(input: &str) -> PResult<'_, u32> {
    let (input, _) = char('U')(input)?;
    let (input, digits) = take_while_m_n(8, 8, |c: char| c.is_ascii_hexdigit())(input)?;
    let cp = u32::from_str_radix(digits, 16).unwrap();
    if cp > 0x10FFFF {
        return Err(nom::Err::Failure(PatternError::msg(
            input,
            "code point out of range (> 0x10FFFF)",
        )));
    }
    Ok((input, cp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_ast_string(rules: &RuleSet, name: &str) -> String {
        let rule = rules.rules.iter().find(|r| &*r.name == name).unwrap();
        format!("{}", rules.arena.display(rule.root))
    }

    #[test]
    fn parses_single_literal() {
        let rules = read_rules("KW_IF if").unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(&*rules.rules[0].name, "KW_IF");
    }

    #[test]
    fn parses_alternation_and_plus() {
        let rules = read_rules("KW_IF if\nIDENT [a-z]+").unwrap();
        assert_eq!(rules.rules.len(), 2);
        assert!(rule_ast_string(&rules, "IDENT").contains("Rep(empty=false"));
    }

    #[test]
    fn parses_star_and_sets() {
        let rules = read_rules("NUM [0-9]+\nWS [ \\t]*").unwrap();
        assert!(rule_ast_string(&rules, "WS").contains("Rep(empty=true"));
    }

    #[test]
    fn parses_unicode_escape() {
        let rules = read_rules("LAMBDA \\u03BB").unwrap();
        assert_eq!(rule_ast_string(&rules, "LAMBDA"), "Set(0x3bb)");
    }

    #[test]
    fn parses_negated_set() {
        let rules = read_rules(r#"STRING "[^"]*""#).unwrap();
        assert!(rule_ast_string(&rules, "STRING").contains("Set(^"));
    }

    #[test]
    fn rejects_unmatched_paren() {
        let err = read_rules("A (ab").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn rejects_bad_escape() {
        let err = read_rules("A \\q").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn rejects_overlong_big_u_escape() {
        let err = read_rules("A \\U00110000").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn rejects_missing_pattern() {
        let err = read_rules("A").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn rejects_bad_name() {
        let err = read_rules("kw_if if").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn priority_order_is_declaration_order() {
        let rules = read_rules("A foo\nB foo").unwrap();
        assert_eq!(&*rules.rules[0].name, "A");
        assert_eq!(&*rules.rules[1].name, "B");
    }
}
