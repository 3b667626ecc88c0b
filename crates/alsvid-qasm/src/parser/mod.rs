//! Parser for `OpenQASM` 2.
//!
//! The parser drives the include-stack scanner and builds directly into a
//! [`Circuit`]: register declarations extend the register maps, gate
//! declarations populate the gate table, and gate applications are expanded
//! into standard operations.

mod expression;
mod gate;

use alsvid_ir::{
    Circuit, ClassicControlledOperation, NonUnitaryOperation, Operation, Qubit, Register,
    MAX_QUBITS,
};

use crate::error::{ParseError, ParseResult};
use crate::gates::GateTable;
use crate::scanner::{ScannedToken, Scanner};
use crate::token::Token;

/// Parse an `OpenQASM` 2 source into a circuit.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    parse_named(source, "qasm")
}

/// Parse an `OpenQASM` 2 source into a circuit with the given name.
pub fn parse_named(source: &str, name: &str) -> ParseResult<Circuit> {
    let mut parser = Parser::new(source, name)?;
    parser.run()?;
    let mut circuit = parser.circuit;

    // Load the reserved layout comments; fall back to the identity layout
    // with the output permutation restricted to non-idle qubits.
    if !load_io_layout(source, &mut circuit) {
        for i in 0..circuit.nqubits {
            circuit.initial_layout.entry(i).or_insert(i);
            if !circuit.is_idle_qubit(i) {
                circuit.output_permutation.entry(i).or_insert(i);
            }
        }
    }
    Ok(circuit)
}

/// A register-slice argument: start index and length.
pub(crate) type Argument = (Qubit, u16);

pub(crate) struct Parser {
    scanner: Scanner,
    la: Option<ScannedToken>,
    /// Position of the most recently consumed token, for error reporting.
    pos: (u32, u32),
    pub(crate) circuit: Circuit,
    pub(crate) gate_table: GateTable,
}

impl Parser {
    pub(crate) fn new(source: &str, name: &str) -> ParseResult<Self> {
        let mut scanner = Scanner::new(source)?;
        let la = scanner.next_token();
        let mut circuit = Circuit::new(name);
        circuit.update_max_controls(2);
        Ok(Self {
            scanner,
            la,
            pos: (1, 1),
            circuit,
            gate_table: GateTable::default(),
        })
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.la.as_ref().map(|t| &t.token)
    }

    pub(crate) fn advance(&mut self) -> Option<ScannedToken> {
        let current = self.la.take();
        if let Some(tok) = &current {
            self.pos = (tok.line, tok.col);
        }
        self.la = self.scanner.next_token();
        current
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    pub(crate) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, expected: &Token) -> ParseResult<ScannedToken> {
        if self.check(expected) {
            self.advance()
                .ok_or_else(|| ParseError::UnexpectedEof(expected.to_string()))
        } else {
            match &self.la {
                Some(tok) => Err(ParseError::Syntax {
                    line: tok.line,
                    col: tok.col,
                    message: format!("expected '{expected}' but found '{}'", tok.token),
                }),
                None => Err(ParseError::UnexpectedEof(expected.to_string())),
            }
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(ScannedToken {
                token: Token::Identifier(s),
                ..
            }) => Ok(s),
            Some(tok) => Err(ParseError::Syntax {
                line: tok.line,
                col: tok.col,
                message: format!("expected identifier but found '{}'", tok.token),
            }),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    pub(crate) fn expect_integer(&mut self) -> ParseResult<u64> {
        match self.advance() {
            Some(ScannedToken {
                token: Token::NnInteger(v),
                ..
            }) => Ok(v),
            Some(tok) => Err(ParseError::Syntax {
                line: tok.line,
                col: tok.col,
                message: format!("expected integer but found '{}'", tok.token),
            }),
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }

    pub(crate) fn expect_string(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(ScannedToken {
                token: Token::Str(s),
                ..
            }) => Ok(s),
            Some(tok) => Err(ParseError::Syntax {
                line: tok.line,
                col: tok.col,
                message: format!("expected string but found '{}'", tok.token),
            }),
            None => Err(ParseError::UnexpectedEof("string".into())),
        }
    }

    pub(crate) fn syntax_error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(ParseError::Syntax {
            line: self.pos.0,
            col: self.pos.1,
            message: message.into(),
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn run(&mut self) -> ParseResult<()> {
        self.expect(&Token::OpenQasm)?;
        match self.advance() {
            Some(ScannedToken {
                token: Token::Real(_) | Token::NnInteger(_),
                ..
            }) => {}
            _ => return self.syntax_error("expected version number after OPENQASM"),
        }
        self.expect(&Token::Semicolon)?;

        while let Some(token) = self.peek() {
            match token {
                Token::Qreg => self.qreg_decl()?,
                Token::Creg => self.creg_decl()?,
                Token::UGate
                | Token::CxGate
                | Token::Swap
                | Token::Identifier(_)
                | Token::Measure
                | Token::Reset => {
                    let op = self.qop()?;
                    self.circuit.ops.push(op);
                }
                Token::Gate => self.gate_decl()?,
                Token::Opaque => self.opaque_decl()?,
                Token::Include => {
                    self.advance();
                    let path = self.expect_string()?;
                    self.scanner.push_include(&path)?;
                    self.expect(&Token::Semicolon)?;
                }
                Token::Barrier => self.barrier_stmt()?,
                Token::If => self.if_stmt()?,
                Token::Snapshot => self.snapshot_stmt()?,
                Token::ShowProbabilities => {
                    self.advance();
                    self.expect(&Token::Semicolon)?;
                    let total = self.circuit.total_qubits();
                    self.circuit
                        .ops
                        .push(NonUnitaryOperation::show_probabilities(total).into());
                }
                other => {
                    let message = format!("unexpected statement: started with '{other}'");
                    return self.syntax_error(message);
                }
            }
        }
        Ok(())
    }

    fn qreg_decl(&mut self) -> ParseResult<()> {
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.expect_integer()? as u16;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;

        let requested = self.circuit.nqubits as usize + size as usize;
        if requested > MAX_QUBITS {
            return Err(alsvid_ir::IrError::CapacityExceeded {
                requested,
                max: MAX_QUBITS,
            }
            .into());
        }

        self.circuit
            .qregs
            .insert(name, Register::new(self.circuit.nqubits, size));
        self.circuit.nqubits += size;
        let total = self.circuit.total_qubits();
        for op in &mut self.circuit.ops {
            op.set_nqubits(total);
        }
        Ok(())
    }

    fn creg_decl(&mut self) -> ParseResult<()> {
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.expect_integer()? as u16;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;

        self.circuit
            .cregs
            .insert(name, Register::new(self.circuit.nclassics, size));
        self.circuit.nclassics += size;
        Ok(())
    }

    fn barrier_stmt(&mut self) -> ParseResult<()> {
        self.advance();
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        let mut qubits = Vec::new();
        for (start, size) in args {
            for q in 0..size {
                qubits.push(start + q);
            }
        }
        let total = self.circuit.total_qubits();
        self.circuit
            .ops
            .push(NonUnitaryOperation::barrier(total, qubits).into());
        Ok(())
    }

    fn if_stmt(&mut self) -> ParseResult<()> {
        self.advance();
        self.expect(&Token::LParen)?;
        let name = self.expect_identifier()?;
        self.expect(&Token::Eq)?;
        let expected = self.expect_integer()?;
        self.expect(&Token::RParen)?;

        let creg = *self
            .circuit
            .cregs
            .get(&name)
            .ok_or(ParseError::UnknownRegister(name))?;

        let op = self.qop()?;
        self.circuit
            .ops
            .push(Operation::ClassicControlled(ClassicControlledOperation {
                op: Box::new(op),
                creg,
                expected,
            }));
        Ok(())
    }

    fn snapshot_stmt(&mut self) -> ParseResult<()> {
        self.advance();
        self.expect(&Token::LParen)?;
        let id = self.expect_integer()? as u32;
        self.expect(&Token::RParen)?;
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        let mut qubits = Vec::new();
        for (start, size) in args {
            if size != 1 {
                return self.syntax_error("snapshot arguments must be single qubits");
            }
            qubits.push(start);
        }
        let total = self.circuit.total_qubits();
        self.circuit
            .ops
            .push(NonUnitaryOperation::snapshot(total, qubits, id).into());
        Ok(())
    }

    /// Parse a quantum operation: gate application, measurement, or reset.
    pub(crate) fn qop(&mut self) -> ParseResult<Operation> {
        match self.peek() {
            Some(Token::UGate | Token::CxGate | Token::Swap | Token::Identifier(_)) => self.gate(),
            Some(Token::Measure) => {
                self.advance();
                let qreg = self.argument_qreg()?;
                self.expect(&Token::Minus)?;
                self.expect(&Token::Gt)?;
                let creg = self.argument_creg()?;
                self.expect(&Token::Semicolon)?;

                if qreg.1 != creg.1 {
                    return Err(ParseError::RegisterSizeMismatch);
                }
                let qubits = (0..qreg.1).map(|i| qreg.0 + i).collect();
                let classics = (0..creg.1).map(|i| creg.0 + i).collect();
                let total = self.circuit.total_qubits();
                Ok(NonUnitaryOperation::measure(total, qubits, classics).into())
            }
            Some(Token::Reset) => {
                self.advance();
                let qreg = self.argument_qreg()?;
                self.expect(&Token::Semicolon)?;

                let qubits = (0..qreg.1).map(|i| qreg.0 + i).collect();
                let total = self.circuit.total_qubits();
                Ok(NonUnitaryOperation::reset(total, qubits).into())
            }
            _ => self.syntax_error("expected a quantum operation"),
        }
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    /// A quantum register argument: `name` or `name[index]`.
    pub(crate) fn argument_qreg(&mut self) -> ParseResult<Argument> {
        let name = self.expect_identifier()?;
        let reg = *self
            .circuit
            .qregs
            .get(&name)
            .ok_or_else(|| ParseError::UnknownRegister(name.clone()))?;

        if self.consume(&Token::LBracket) {
            let offset = self.expect_integer()?;
            self.expect(&Token::RBracket)?;
            if offset >= u64::from(reg.size) {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index: offset,
                    size: reg.size,
                });
            }
            return Ok((reg.start + offset as u16, 1));
        }
        Ok((reg.start, reg.size))
    }

    /// A classical register argument: `name` or `name[index]`.
    pub(crate) fn argument_creg(&mut self) -> ParseResult<Argument> {
        let name = self.expect_identifier()?;
        let reg = *self
            .circuit
            .cregs
            .get(&name)
            .ok_or_else(|| ParseError::UnknownRegister(name.clone()))?;

        if self.consume(&Token::LBracket) {
            let offset = self.expect_integer()?;
            self.expect(&Token::RBracket)?;
            if offset >= u64::from(reg.size) {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index: offset,
                    size: reg.size,
                });
            }
            return Ok((reg.start + offset as u16, 1));
        }
        Ok((reg.start, reg.size))
    }

    /// A comma-separated list of quantum register arguments.
    pub(crate) fn arg_list(&mut self) -> ParseResult<Vec<Argument>> {
        let mut args = vec![self.argument_qreg()?];
        while self.consume(&Token::Comma) {
            args.push(self.argument_qreg()?);
        }
        Ok(args)
    }

    /// A comma-separated list of identifiers.
    pub(crate) fn id_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.expect_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.expect_identifier()?);
        }
        Ok(ids)
    }
}

/// Load the reserved `// i …` / `// o …` layout comments from the source.
///
/// Returns `true` when an output line was found. An incomplete output list
/// marks every logical qubit without an output as garbage.
pub(crate) fn load_io_layout(source: &str, circuit: &mut Circuit) -> bool {
    for line in source.lines() {
        let Some(rest) = line.trim_start().strip_prefix("//") else {
            continue;
        };
        let rest = rest.trim_start();
        if let Some(values) = rest
            .strip_prefix('i')
            .filter(|v| v.is_empty() || v.starts_with(char::is_whitespace))
        {
            let mut numbers = values.split_whitespace();
            for logical in 0..circuit.nqubits {
                match numbers.next().and_then(|t| t.parse::<Qubit>().ok()) {
                    Some(physical) => {
                        circuit.initial_layout.insert(physical, logical);
                    }
                    None => return false,
                }
            }
        } else if let Some(values) = rest
            .strip_prefix('o')
            .filter(|v| v.is_empty() || v.starts_with(char::is_whitespace))
        {
            let mut numbers = values.split_whitespace();
            for logical in 0..circuit.nqubits {
                match numbers.next().and_then(|t| t.parse::<Qubit>().ok()) {
                    Some(physical) => {
                        circuit.output_permutation.insert(physical, logical);
                    }
                    None => {
                        // Incomplete output permutation: the unlisted logical
                        // qubits are garbage.
                        let live: Vec<Qubit> =
                            circuit.output_permutation.values().copied().collect();
                        let assigned: Vec<Qubit> =
                            circuit.initial_layout.values().copied().collect();
                        for logical in assigned {
                            if !live.contains(&logical) {
                                circuit.set_logical_qubit_garbage(logical);
                            }
                        }
                        return true;
                    }
                }
            }
            return true;
        }
    }
    false
}
