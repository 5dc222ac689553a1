#![doc = include_str!("../README.md")]

use std::io::Write;
use std::str::SplitWhitespace;

use guacamole::{FromGuacamole, Guacamole};

///////////////////////////////////////////// constants ////////////////////////////////////////////

/// Maximum number of values the operand stack will hold.  Pushing a 24th value
/// discards it with a diagnostic.
pub const MAX_STACK_DEPTH: usize = 23;

/// Default seed for the pseudorandom source.  Two sessions with the same seed
/// see the same sequence of draws from `r`.
pub const DEFAULT_SEED: u64 = 15;

///////////////////////////////////////////// comments /////////////////////////////////////////////

/// Delete every comment from `line`.  A comment is a matched pair of `#`
/// markers and everything between them; pairs are matched left to right.  An
/// unpaired `#` is not a comment and passes through untouched.
pub fn strip_comments(line: &str) -> String {
    let mut output = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('#') {
        match rest[open + 1..].find('#') {
            Some(close) => {
                output.push_str(&rest[..open]);
                rest = &rest[open + 1 + close + 1..];
            }
            None => {
                break;
            }
        }
    }
    output.push_str(rest);
    output
}

/////////////////////////////////////////////// BinOp //////////////////////////////////////////////

/// A binary arithmetic operator.  `eval` takes the left operand first, so for
/// the token sequence `b a OP` the call is `eval(b, a)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    pub fn eval(self, b: i32, a: i32) -> i32 {
        match self {
            BinOp::Add => add(b, a),
            BinOp::Sub => subtract(b, a),
            BinOp::Mul => multiply(b, a),
            BinOp::Div => divide(b, a),
            BinOp::Mod => modulus(b, a),
            BinOp::Pow => power(b, a),
        }
    }
}

/////////////////////////////////////////////// Token //////////////////////////////////////////////

/// One classified unit of input.  Unrecognized input carries the original text
/// verbatim for the diagnostic.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token<'a> {
    /// A literal, an optional `-` followed by decimal digits, in i32 range.
    IntegerLiteral(i32),
    /// One of `+` `-` `*` `/` `%` `^`.
    Operator(BinOp),
    /// One of `+=` `-=` `*=` `/=` `%=` `^=`: print the top of the stack, then
    /// apply the operator.
    CompoundAssign(BinOp),
    /// `=`: print the top of the stack without popping it.
    Equals,
    /// `d`: print the whole stack, top to bottom.
    Display,
    /// `r`: push the next pseudorandom non-negative integer.
    Random,
    /// Anything else, as one unit.  A malformed word like `12a` is never
    /// split into smaller tokens.
    Unrecognized(&'a str),
}

impl<'a> Token<'a> {
    /// Classify one whitespace-delimited word.  Integer literals take
    /// precedence, then compound assignments, then operators, then the
    /// single-letter commands, then `=`.  A word shaped like a literal whose
    /// digits overflow i32 falls through to [Token::Unrecognized], it does not
    /// clamp.
    pub fn classify(text: &'a str) -> Self {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(value) = text.parse::<i32>() {
                return Token::IntegerLiteral(value);
            }
        }
        match text {
            "+=" => Token::CompoundAssign(BinOp::Add),
            "-=" => Token::CompoundAssign(BinOp::Sub),
            "*=" => Token::CompoundAssign(BinOp::Mul),
            "/=" => Token::CompoundAssign(BinOp::Div),
            "%=" => Token::CompoundAssign(BinOp::Mod),
            "^=" => Token::CompoundAssign(BinOp::Pow),
            "+" => Token::Operator(BinOp::Add),
            "-" => Token::Operator(BinOp::Sub),
            "*" => Token::Operator(BinOp::Mul),
            "/" => Token::Operator(BinOp::Div),
            "%" => Token::Operator(BinOp::Mod),
            "^" => Token::Operator(BinOp::Pow),
            "d" => Token::Display,
            "r" => Token::Random,
            "=" => Token::Equals,
            _ => Token::Unrecognized(text),
        }
    }
}

///////////////////////////////////////////// Tokenizer ////////////////////////////////////////////

/// A lazy left-to-right tokenizer over one comment-stripped line.  Splits on
/// runs of whitespace, so an empty line yields no tokens.
pub struct Tokenizer<'a> {
    words: SplitWhitespace<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Tokenizer {
            words: line.split_whitespace(),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.words.next().map(Token::classify)
    }
}

//////////////////////////////////////////// arithmetic ////////////////////////////////////////////

/// Saturating addition.  Only the high side clamps:  a sum above `i32::MAX`
/// returns `i32::MAX`, while a sum below `i32::MIN` wraps the way 32-bit
/// addition does.
pub fn add(b: i32, a: i32) -> i32 {
    let sum = b as i64 + a as i64;
    if sum > i32::MAX as i64 {
        i32::MAX
    } else {
        sum as i32
    }
}

/// Saturating subtraction.  Only the low side clamps, mirroring [add].
pub fn subtract(b: i32, a: i32) -> i32 {
    let difference = b as i64 - a as i64;
    if difference < i32::MIN as i64 {
        i32::MIN
    } else {
        difference as i32
    }
}

/// Saturating multiplication.  Clamps at both bounds.
pub fn multiply(b: i32, a: i32) -> i32 {
    let product = b as i64 * a as i64;
    if product < i32::MIN as i64 {
        i32::MIN
    } else if product > i32::MAX as i64 {
        i32::MAX
    } else {
        product as i32
    }
}

/// Integer division truncated toward zero.  The quotient's magnitude never
/// exceeds `b`'s, so there is no saturation.  The zero-divisor case is guarded
/// by the stack machine before this runs; `i32::MIN / -1` wraps to `i32::MIN`.
pub fn divide(b: i32, a: i32) -> i32 {
    b.wrapping_div(a)
}

/// Integer remainder with the sign of the dividend `b`.
///
/// # Panics
///
/// Panics if `a` is zero.  Unlike [divide] there is no guard: a zero divisor
/// under `%` is a fatal fault, and the asymmetry is intentional.
pub fn modulus(b: i32, a: i32) -> i32 {
    b.wrapping_rem(a)
}

/// `b` raised to the power `a`, computed over f64 and cast back with the
/// saturating, truncating `as` conversion.  Overflow clamps to the i32
/// bounds.  A negative exponent yields a fraction that truncates toward zero,
/// so it is 0 whenever `|b| > 1`; `0` to a negative power is infinite and
/// saturates to `i32::MAX`.
pub fn power(b: i32, a: i32) -> i32 {
    (b as f64).powi(a) as i32
}

/////////////////////////////////////////////// Stack //////////////////////////////////////////////

/// The bounded operand stack.  Holds at most [MAX_STACK_DEPTH] values; every
/// value on it was clamped by the operation that produced it.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    values: Vec<i32>,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            values: Vec::with_capacity(MAX_STACK_DEPTH),
        }
    }

    /// Push `value`, returning false (and discarding `value`) when the stack
    /// is at capacity.
    pub fn push(&mut self, value: i32) -> bool {
        if self.values.len() >= MAX_STACK_DEPTH {
            return false;
        }
        self.values.push(value);
        true
    }

    pub fn pop(&mut self) -> Option<i32> {
        self.values.pop()
    }

    pub fn peek(&self) -> Option<i32> {
        self.values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values in push order, bottom of the stack first.
    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }
}

///////////////////////////////////////////// Calculator ///////////////////////////////////////////

/// The stack machine.  Owns the operand stack and the pseudorandom source and
/// folds a token stream over them, writing display lines and diagnostics to
/// the writer each operation is handed.
///
/// Every error short of a zero divisor under `%` recovers locally: the
/// operation reports to the writer, restores any speculatively popped operand,
/// and the token loop continues.
pub struct Calculator {
    stack: Stack,
    random: Guacamole,
}

impl Calculator {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Calculator {
            stack: Stack::new(),
            random: Guacamole::new(seed),
        }
    }

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[i32] {
        self.stack.as_slice()
    }

    /// Strip comments from `line`, tokenize what remains, and apply each token
    /// in order.
    pub fn process_line<W: Write>(&mut self, line: &str, out: &mut W) -> std::io::Result<()> {
        let line = strip_comments(line);
        for token in Tokenizer::new(&line) {
            self.apply(token, out)?;
        }
        Ok(())
    }

    /// Apply one token to the stack.
    pub fn apply<W: Write>(&mut self, token: Token<'_>, out: &mut W) -> std::io::Result<()> {
        match token {
            Token::IntegerLiteral(value) => self.push(value, out),
            Token::Operator(op) => self.binop(op, out),
            Token::CompoundAssign(op) => {
                self.display_top(out)?;
                self.binop(op, out)
            }
            Token::Equals => self.display_top(out),
            Token::Display => self.display_all(out),
            Token::Random => self.random_push(out),
            Token::Unrecognized(raw) => {
                writeln!(out, "Unrecognised operator or operand \"{}\".", raw)
            }
        }
    }

    /// Push `value`, reporting `Stack Overflow.` and discarding it at
    /// capacity.
    pub fn push<W: Write>(&mut self, value: i32, out: &mut W) -> std::io::Result<()> {
        if !self.stack.push(value) {
            writeln!(out, "Stack Overflow.")?;
        }
        Ok(())
    }

    /// Draw the next non-negative integer from the pseudorandom source and
    /// push it, subject to the same capacity check as a literal.
    pub fn random_push<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let draw = u32::from_guacamole(&mut (), &mut self.random);
        // Drop the top bit so the draw is never negative.
        self.push((draw >> 1) as i32, out)
    }

    /// Print the top of the stack without popping it, or `Stack empty.`.
    pub fn display_top<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match self.stack.peek() {
            Some(value) => writeln!(out, "{}", value),
            None => writeln!(out, "Stack empty."),
        }
    }

    /// Print the stack top to bottom, one value per line.  An empty stack
    /// prints the sentinel `i32::MIN` rather than a diagnostic.
    pub fn display_all<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.stack.is_empty() {
            return writeln!(out, "{}", i32::MIN);
        }
        for value in self.stack.as_slice().iter().rev() {
            writeln!(out, "{}", value)?;
        }
        Ok(())
    }

    // The shared two-operand protocol.  Pop the top as `a`; on an empty stack
    // report underflow and stop with nothing changed.  Pop the next as `b`; if
    // that fails, report underflow and put `a` back.  Otherwise push
    // `op(b, a)` directly:  the net effect shrinks the stack, so the capacity
    // check cannot fire.
    //
    // Divide guards before `b` is popped:  a zero on top or a zero beneath it
    // reports `Divide by 0.` and restores `a`.
    fn binop<W: Write>(&mut self, op: BinOp, out: &mut W) -> std::io::Result<()> {
        let a = match self.stack.pop() {
            Some(a) => a,
            None => {
                return writeln!(out, "Stack underflow.");
            }
        };
        if op == BinOp::Div && (a == 0 || self.stack.peek() == Some(0)) {
            writeln!(out, "Divide by 0.")?;
            self.stack.push(a);
            return Ok(());
        }
        let b = match self.stack.pop() {
            Some(b) => b,
            None => {
                writeln!(out, "Stack underflow.")?;
                self.stack.push(a);
                return Ok(());
            }
        };
        self.stack.push(op.eval(b, a));
        Ok(())
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

/////////////////////////////////////////////// tests //////////////////////////////////////////////
