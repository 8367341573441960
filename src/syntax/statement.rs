use std::fmt;

use crate::kernel::environment::{CompositeDecl, OperatorDecl};
use crate::kernel::proposition::{Atomic, Implication, Proposition};
use crate::kernel::symbol::{join, Symbol};
use crate::syntax::token::{ParseResult, Token, TokenIter, TokenType};

/// Pattern variables claim every name matching a regular expression. For example:
///   lets n "^[0-9]+$": nat(n);
pub struct LetsStatement {
    pub name: String,
    pub pattern: String,
    pub facts: Vec<Proposition>,
}

/// Let statements introduce new variables, optionally with facts about them. For example:
///   let Socrates: human(Socrates);
pub struct LetStatement {
    pub vars: Vec<String>,
    pub facts: Vec<Proposition>,
}

/// Know statements assert facts without proof.
/// A single implication can be named, so that "by" can apply it later.
pub struct KnowStatement {
    pub name: Option<String>,
    pub facts: Vec<Proposition>,
}

/// A direct proof. The body runs in a child scope where the goal's premises are assumed.
pub struct ProveStatement {
    pub name: Option<String>,
    pub goal: Proposition,
    pub body: Vec<Statement>,
}

/// Assumes the opposite of the goal, then exhibits a witness that is both true and false.
pub struct ContradictionStatement {
    pub goal: Proposition,
    pub body: Vec<Statement>,
    pub witness: Proposition,
}

/// Applies a named implication to specific symbols. For example:
///   by rule(Socrates);
pub struct ByStatement {
    pub lemma: String,
    pub args: Vec<Symbol>,
}

/// A program is a sequence of statements, each ending in a semicolon or a block.
pub struct Statement {
    pub first_line: u32,
    pub last_line: u32,
    pub statement: StatementInfo,
}

/// Information about a statement that is specific to the type of statement it is
pub enum StatementInfo {
    DefOperator(OperatorDecl),
    DefComposite(CompositeDecl),
    Lets(LetsStatement),
    Let(LetStatement),
    Know(KnowStatement),

    // Propositions to check, and remember if they hold.
    Check(Vec<Proposition>),

    Prove(ProveStatement),
    ProveByContradiction(ContradictionStatement),
    By(ByStatement),
    LocalBlock(Vec<Statement>),
}

/// Parses a block where the left brace has already been consumed.
/// Returns the statements along with the right brace that ended the block.
fn parse_block(tokens: &mut TokenIter) -> ParseResult<(Vec<Statement>, Token)> {
    let mut body = Vec::new();
    loop {
        match Statement::parse(tokens, true)? {
            (Some(s), _) => body.push(s),
            (None, Some(brace)) => return Ok((body, brace)),
            (None, None) => return Err(tokens.error("expected '}' to close the block")),
        }
    }
}

/// Parses a comma-separated list of names, like "x, y".
fn parse_names(tokens: &mut TokenIter) -> ParseResult<Vec<String>> {
    let mut names = vec![tokens.expect_type(TokenType::Identifier)?.text];
    while tokens.skip(TokenType::Comma) {
        names.push(tokens.expect_type(TokenType::Identifier)?.text);
    }
    Ok(names)
}

/// Parses names up to and including the closing token. The list may be empty.
fn parse_names_until(tokens: &mut TokenIter, close: TokenType) -> ParseResult<Vec<String>> {
    if tokens.skip(close) {
        return Ok(vec![]);
    }
    let names = parse_names(tokens)?;
    tokens.expect_type(close)?;
    Ok(names)
}

/// A singleton like "a", or a composite like "\pair{a, b}".
fn parse_symbol(tokens: &mut TokenIter) -> ParseResult<Symbol> {
    let token = tokens.expect_token()?;
    match token.token_type {
        TokenType::Identifier => Ok(Symbol::Singleton(token.text)),
        TokenType::Backslash => {
            let name = tokens.expect_type(TokenType::Identifier)?.text;
            tokens.expect_type(TokenType::LeftBrace)?;
            let args = parse_symbols_until(tokens, TokenType::RightBrace)?;
            Ok(Symbol::composite(name, args))
        }
        _ => Err(token.error("expected a symbol")),
    }
}

fn parse_symbols_until(tokens: &mut TokenIter, close: TokenType) -> ParseResult<Vec<Symbol>> {
    let mut symbols = vec![];
    if tokens.skip(close) {
        return Ok(symbols);
    }
    loop {
        symbols.push(parse_symbol(tokens)?);
        if tokens.skip(TokenType::Comma) {
            continue;
        }
        tokens.expect_type(close)?;
        return Ok(symbols);
    }
}

/// Check hints, like "[a, b; c]", where the left bracket has already been consumed.
/// Semicolons separate the layers.
fn parse_hints(tokens: &mut TokenIter) -> ParseResult<Vec<Vec<Symbol>>> {
    let mut layers = vec![];
    let mut layer = vec![];
    loop {
        match tokens.peek_type() {
            Some(TokenType::RightBracket) => {
                tokens.next();
                layers.push(layer);
                return Ok(layers);
            }
            Some(TokenType::Semicolon) => {
                tokens.next();
                layers.push(std::mem::take(&mut layer));
            }
            Some(TokenType::Comma) => {
                tokens.next();
            }
            _ => layer.push(parse_symbol(tokens)?),
        }
    }
}

/// Either "op(args)" with optional hints, or "symbol is op", or "symbol is not op".
fn parse_atomic(tokens: &mut TokenIter) -> ParseResult<Atomic> {
    if tokens.peek_type() == Some(TokenType::Identifier)
        && tokens.peek_second_type() == Some(TokenType::LeftParen)
    {
        let operator = tokens.expect_token()?.text;
        tokens.expect_type(TokenType::LeftParen)?;
        let args = parse_symbols_until(tokens, TokenType::RightParen)?;
        let mut atomic = Atomic::new(operator, args);
        if tokens.skip(TokenType::LeftBracket) {
            atomic.hints = Some(parse_hints(tokens)?);
        }
        return Ok(atomic);
    }

    let subject = parse_symbol(tokens)?;
    tokens.expect_type(TokenType::Is)?;
    let positive = !tokens.skip(TokenType::Not);
    let operator = tokens.expect_type(TokenType::Identifier)?.text;
    let mut atomic = Atomic::new(operator, vec![subject]);
    atomic.positive = positive;
    Ok(atomic)
}

/// The part of an implication after "if" or "iff":
///   x, y: premises => {conclusions}
/// Both the variables and the premises are optional.
fn parse_implication_tail(tokens: &mut TokenIter) -> ParseResult<Implication> {
    let mut vars = vec![];
    if !tokens.skip(TokenType::Colon) {
        let start = tokens.position();
        match parse_names(tokens) {
            Ok(names) if tokens.skip(TokenType::Colon) => vars = names,
            _ => tokens.restore(start),
        }
    }
    let premises = if tokens.peek_type() == Some(TokenType::RightArrow) {
        vec![]
    } else {
        parse_fact_list(tokens)?
    };
    tokens.expect_type(TokenType::RightArrow)?;
    tokens.expect_type(TokenType::LeftBrace)?;
    let conclusions = parse_facts_until(tokens, TokenType::RightBrace)?;
    Ok(Implication {
        vars,
        premises,
        conclusions,
        positive: true,
    })
}

fn parse_unary(tokens: &mut TokenIter) -> ParseResult<Proposition> {
    match tokens.peek_type() {
        Some(TokenType::Not) => {
            tokens.next();
            Ok(parse_unary(tokens)?.negated())
        }
        Some(TokenType::If) => {
            tokens.next();
            Ok(Proposition::Implication(parse_implication_tail(tokens)?))
        }
        Some(TokenType::LeftParen) => {
            tokens.next();
            let fact = parse_fact(tokens)?;
            tokens.expect_type(TokenType::RightParen)?;
            Ok(fact)
        }
        Some(TokenType::Iff) => Err(tokens.error("iff can only appear in a list of facts")),
        _ => Ok(Proposition::Atomic(parse_atomic(tokens)?)),
    }
}

/// A single proposition, possibly a disjunction like "p(a) or q(a)".
fn parse_fact(tokens: &mut TokenIter) -> ParseResult<Proposition> {
    let first = parse_unary(tokens)?;
    if tokens.peek_type() != Some(TokenType::Or) {
        return Ok(first);
    }
    let mut alternatives = vec![first];
    while tokens.skip(TokenType::Or) {
        alternatives.push(parse_unary(tokens)?);
    }
    Ok(Proposition::disjunction(alternatives))
}

/// A comma-separated list of facts.
/// An "iff" expands into the implications in both directions.
fn parse_fact_list(tokens: &mut TokenIter) -> ParseResult<Vec<Proposition>> {
    let mut facts = vec![];
    loop {
        if tokens.skip(TokenType::Iff) {
            let forward = parse_implication_tail(tokens)?;
            let backward = Implication {
                vars: forward.vars.clone(),
                premises: forward.conclusions.clone(),
                conclusions: forward.premises.clone(),
                positive: true,
            };
            facts.push(Proposition::Implication(forward));
            facts.push(Proposition::Implication(backward));
        } else {
            facts.push(parse_fact(tokens)?);
        }
        if !tokens.skip(TokenType::Comma) {
            return Ok(facts);
        }
    }
}

fn parse_facts_until(tokens: &mut TokenIter, close: TokenType) -> ParseResult<Vec<Proposition>> {
    if tokens.skip(close) {
        return Ok(vec![]);
    }
    let facts = parse_fact_list(tokens)?;
    tokens.expect_type(close)?;
    Ok(facts)
}

/// Parses "facts;" or just ";", for statements where a colon introduced optional facts.
fn parse_optional_facts(tokens: &mut TokenIter) -> ParseResult<Vec<Proposition>> {
    if tokens.skip(TokenType::Colon) {
        let facts = parse_fact_list(tokens)?;
        tokens.expect_type(TokenType::Semicolon)?;
        Ok(facts)
    } else {
        tokens.expect_type(TokenType::Semicolon)?;
        Ok(vec![])
    }
}

/// def name(params) => {consequences} when guards;
/// The arrow can also be "<=>", and every part after the parameters is optional.
fn parse_def_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let name = tokens.expect_type(TokenType::Identifier)?.text;
    tokens.expect_type(TokenType::LeftParen)?;
    let params = parse_names_until(tokens, TokenType::RightParen)?;
    let mut decl = OperatorDecl::new(name, params);
    match tokens.peek_type() {
        Some(TokenType::RightArrow) | Some(TokenType::LeftRightArrow) => {
            decl.iff = tokens.expect_token()?.token_type == TokenType::LeftRightArrow;
            tokens.expect_type(TokenType::LeftBrace)?;
            decl.consequences = parse_facts_until(tokens, TokenType::RightBrace)?;
        }
        _ => {}
    }
    if tokens.skip(TokenType::When) {
        decl.guards = parse_fact_list(tokens)?;
    }
    tokens.expect_type(TokenType::Semicolon)?;
    Ok(StatementInfo::DefOperator(decl))
}

/// def_composite \name{params}: constraints;
fn parse_def_composite_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    tokens.expect_type(TokenType::Backslash)?;
    let name = tokens.expect_type(TokenType::Identifier)?.text;
    tokens.expect_type(TokenType::LeftBrace)?;
    let params = parse_names_until(tokens, TokenType::RightBrace)?;
    let constraints = parse_optional_facts(tokens)?;
    Ok(StatementInfo::DefComposite(CompositeDecl {
        name,
        params,
        constraints,
    }))
}

fn parse_lets_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let name = tokens.expect_type(TokenType::Identifier)?.text;
    let pattern = tokens.expect_type(TokenType::StringLiteral)?.text;
    let facts = parse_optional_facts(tokens)?;
    Ok(StatementInfo::Lets(LetsStatement {
        name,
        pattern,
        facts,
    }))
}

fn parse_let_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let vars = parse_names(tokens)?;
    let facts = parse_optional_facts(tokens)?;
    Ok(StatementInfo::Let(LetStatement { vars, facts }))
}

/// Checks for a "name:" prefix, as in "know rule: ..." or "prove lemma: ...".
fn parse_label(tokens: &mut TokenIter) -> Option<String> {
    if tokens.peek_type() == Some(TokenType::Identifier)
        && tokens.peek_second_type() == Some(TokenType::Colon)
    {
        let name = tokens.next().map(|t| t.text);
        tokens.next();
        name
    } else {
        None
    }
}

fn parse_know_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let name = parse_label(tokens);
    let facts = parse_fact_list(tokens)?;
    tokens.expect_type(TokenType::Semicolon)?;
    Ok(StatementInfo::Know(KnowStatement { name, facts }))
}

fn parse_prove_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let name = parse_label(tokens);
    let goal = parse_fact(tokens)?;
    tokens.expect_type(TokenType::LeftBrace)?;
    let (body, _) = parse_block(tokens)?;
    tokens.skip(TokenType::Semicolon);
    Ok(StatementInfo::Prove(ProveStatement { name, goal, body }))
}

fn parse_contradiction_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let goal = parse_fact(tokens)?;
    tokens.expect_type(TokenType::LeftBrace)?;
    let (body, _) = parse_block(tokens)?;
    tokens.expect_type(TokenType::Contradiction)?;
    let witness = parse_fact(tokens)?;
    tokens.expect_type(TokenType::Semicolon)?;
    Ok(StatementInfo::ProveByContradiction(ContradictionStatement {
        goal,
        body,
        witness,
    }))
}

fn parse_by_statement(tokens: &mut TokenIter) -> ParseResult<StatementInfo> {
    let lemma = tokens.expect_type(TokenType::Identifier)?.text;
    tokens.expect_type(TokenType::LeftParen)?;
    let args = parse_symbols_until(tokens, TokenType::RightParen)?;
    tokens.expect_type(TokenType::Semicolon)?;
    Ok(StatementInfo::By(ByStatement { lemma, args }))
}

impl Statement {
    /// Tries to parse a single statement from the provided tokens.
    /// If in_block is true, we might get a right brace instead of a statement.
    /// Returns the statement, or the right brace token if the current block ended.
    /// Returns Ok((None, None)) if the end of the input was reached.
    pub fn parse(
        tokens: &mut TokenIter,
        in_block: bool,
    ) -> ParseResult<(Option<Statement>, Option<Token>)> {
        let Some(first) = tokens.peek().cloned() else {
            return Ok((None, None));
        };
        let info = match first.token_type {
            TokenType::RightBrace => {
                if !in_block {
                    return Err(first.error("unmatched right brace at top level"));
                }
                tokens.next();
                return Ok((None, Some(first)));
            }
            TokenType::Def => {
                tokens.next();
                parse_def_statement(tokens)?
            }
            TokenType::DefComposite => {
                tokens.next();
                parse_def_composite_statement(tokens)?
            }
            TokenType::Lets => {
                tokens.next();
                parse_lets_statement(tokens)?
            }
            TokenType::Let => {
                tokens.next();
                parse_let_statement(tokens)?
            }
            TokenType::Know => {
                tokens.next();
                parse_know_statement(tokens)?
            }
            TokenType::Prove => {
                tokens.next();
                parse_prove_statement(tokens)?
            }
            TokenType::ProveByContradiction => {
                tokens.next();
                parse_contradiction_statement(tokens)?
            }
            TokenType::By => {
                tokens.next();
                parse_by_statement(tokens)?
            }
            TokenType::LeftBrace => {
                tokens.next();
                let (body, _) = parse_block(tokens)?;
                tokens.skip(TokenType::Semicolon);
                StatementInfo::LocalBlock(body)
            }
            TokenType::Invalid => return Err(first.error("unterminated string")),
            _ => {
                let facts = parse_fact_list(tokens)?;
                tokens.expect_type(TokenType::Semicolon)?;
                StatementInfo::Check(facts)
            }
        };
        let statement = Statement {
            first_line: first.line,
            last_line: tokens.last_line(),
            statement: info,
        };
        Ok((Some(statement), None))
    }

    /// Parses every statement in the input.
    pub fn parse_all(input: &str) -> ParseResult<Vec<Statement>> {
        let mut tokens = TokenIter::new(Token::scan(input));
        let mut statements = vec![];
        while let (Some(statement), _) = Statement::parse(&mut tokens, false)? {
            statements.push(statement);
        }
        Ok(statements)
    }

    /// Parses input that should hold exactly one statement.
    pub fn parse_str(input: &str) -> ParseResult<Statement> {
        let mut tokens = TokenIter::new(Token::scan(input));
        match Statement::parse(&mut tokens, false)? {
            (Some(statement), _) if tokens.is_done() => Ok(statement),
            (Some(_), _) => Err(tokens.error("expected a single statement")),
            _ => Err(tokens.error("expected a statement")),
        }
    }
}

fn write_block(f: &mut fmt::Formatter, body: &[Statement]) -> fmt::Result {
    write!(f, "{{")?;
    for statement in body {
        write!(f, " {}", statement)?;
    }
    write!(f, " }}")
}

fn write_label(f: &mut fmt::Formatter, name: &Option<String>) -> fmt::Result {
    match name {
        Some(name) => write!(f, "{}: ", name),
        None => Ok(()),
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.statement {
            StatementInfo::DefOperator(decl) => {
                write!(f, "def {}({})", decl.name, decl.params.join(", "))?;
                if !decl.consequences.is_empty() {
                    let arrow = if decl.iff { "<=>" } else { "=>" };
                    write!(f, " {} {{{}}}", arrow, join(&decl.consequences, ", "))?;
                }
                if !decl.guards.is_empty() {
                    write!(f, " when {}", join(&decl.guards, ", "))?;
                }
                write!(f, ";")
            }
            StatementInfo::DefComposite(decl) => {
                write!(f, "def_composite \\{}{{{}}}", decl.name, decl.params.join(", "))?;
                if !decl.constraints.is_empty() {
                    write!(f, ": {}", join(&decl.constraints, ", "))?;
                }
                write!(f, ";")
            }
            StatementInfo::Lets(ls) => {
                write!(f, "lets {} \"{}\"", ls.name, ls.pattern)?;
                if !ls.facts.is_empty() {
                    write!(f, ": {}", join(&ls.facts, ", "))?;
                }
                write!(f, ";")
            }
            StatementInfo::Let(ls) => {
                write!(f, "let {}", ls.vars.join(", "))?;
                if !ls.facts.is_empty() {
                    write!(f, ": {}", join(&ls.facts, ", "))?;
                }
                write!(f, ";")
            }
            StatementInfo::Know(ks) => {
                write!(f, "know ")?;
                write_label(f, &ks.name)?;
                write!(f, "{};", join(&ks.facts, ", "))
            }
            StatementInfo::Check(facts) => write!(f, "{};", join(facts, ", ")),
            StatementInfo::Prove(ps) => {
                write!(f, "prove ")?;
                write_label(f, &ps.name)?;
                write!(f, "{} ", ps.goal)?;
                write_block(f, &ps.body)
            }
            StatementInfo::ProveByContradiction(cs) => {
                write!(f, "prove_by_contradiction {} ", cs.goal)?;
                write_block(f, &cs.body)?;
                write!(f, " contradiction {};", cs.witness)
            }
            StatementInfo::By(bs) => write!(f, "by {}({});", bs.lemma, join(&bs.args, ", ")),
            StatementInfo::LocalBlock(body) => write_block(f, body),
        }
    }
}
