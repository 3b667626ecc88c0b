//! Gate applications and gate declarations.
//!
//! Gate declarations are inlined against the table as they are parsed, so
//! every entry carries a flat `U`/`CX`/`CU`/`MCX` body. Applications resolve
//! either directly or through controlled inference: a name `c…cG` with no
//! definition of its own falls back to a single-body definition of `G`,
//! synthesising the controls at the call site.

use alsvid_ir::{CompoundOperation, Control, OpKind, Operation, StandardOperation};

use super::{Argument, Parser};
use crate::error::{ParseError, ParseResult};
use crate::expr::{rewrite, Expr, ParamEnv};
use crate::gates::{strip_controls, BodyGate, GateDef};
use crate::token::Token;
use rustc_hash::FxHashMap;

fn constant(expr: &Expr) -> ParseResult<f64> {
    expr.number().ok_or(ParseError::NonConstantParameter)
}

fn rewritten(expr: &Expr, env: &ParamEnv) -> ParseResult<f64> {
    constant(&rewrite(expr, env))
}

impl Parser {
    /// Parse a gate application and expand it into an operation.
    pub(crate) fn gate(&mut self) -> ParseResult<Operation> {
        match self.peek() {
            Some(Token::UGate) => self.native_u(),
            Some(Token::Swap) => self.native_swap(),
            Some(Token::CxGate) => self.native_cx(),
            Some(Token::Identifier(_)) => self.gate_call(),
            _ => self.syntax_error("expected a gate application"),
        }
    }

    /// Native `U(θ, φ, λ) q;`.
    fn native_u(&mut self) -> ParseResult<Operation> {
        self.advance();
        self.expect(&Token::LParen)?;
        let theta = self.parse_exp()?;
        self.expect(&Token::Comma)?;
        let phi = self.parse_exp()?;
        self.expect(&Token::Comma)?;
        let lambda = self.parse_exp()?;
        self.expect(&Token::RParen)?;
        let target = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        let (theta, phi, lambda) = (constant(&theta)?, constant(&phi)?, constant(&lambda)?);
        let total = self.circuit.total_qubits();
        if target.1 == 1 {
            return Ok(StandardOperation::u3(total, vec![], target.0, lambda, phi, theta).into());
        }

        let mut compound = CompoundOperation::new(total);
        for i in 0..target.1 {
            compound.push(StandardOperation::u3(
                total,
                vec![],
                target.0 + i,
                lambda,
                phi,
                theta,
            ));
        }
        Ok(compound.into())
    }

    /// Native `swap a, b;`.
    fn native_swap(&mut self) -> ParseResult<Operation> {
        self.advance();
        let first = self.argument_qreg()?;
        self.expect(&Token::Comma)?;
        let second = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        if first.1 != 1 || second.1 != 1 {
            return self.syntax_error("swap over whole qubit registers is not supported");
        }
        if first.0 == second.0 {
            return Err(ParseError::DuplicateQubit(first.0));
        }
        let total = self.circuit.total_qubits();
        Ok(StandardOperation::two_target(total, vec![], first.0, second.0, OpKind::Swap).into())
    }

    /// Native `CX c, t;` with register broadcast.
    fn native_cx(&mut self) -> ParseResult<Operation> {
        self.advance();
        let control = self.argument_qreg()?;
        self.expect(&Token::Comma)?;
        let target = self.argument_qreg()?;
        self.expect(&Token::Semicolon)?;

        check_control_target_overlap(control, target)?;

        let total = self.circuit.total_qubits();
        if control.1 == 1 && target.1 == 1 {
            return Ok(StandardOperation::controlled(
                total,
                vec![Control::pos(control.0)],
                target.0,
                OpKind::X,
            )
            .into());
        }

        let mut compound = CompoundOperation::new(total);
        broadcast_cx(&mut compound, total, control, target)?;
        Ok(compound.into())
    }

    /// Gate application through the table, including controlled inference.
    fn gate_call(&mut self) -> ParseResult<Operation> {
        let name = self.expect_identifier()?;
        let (base, ncontrols) = {
            let (base, n) = strip_controls(&name);
            (base.to_string(), n)
        };
        let total = self.circuit.total_qubits();

        // Controlled swap gets its own path: controls plus two targets.
        if base == "swap" && ncontrols > 0 {
            let args = self.arg_list()?;
            self.expect(&Token::Semicolon)?;
            if args.len() != ncontrols + 2 {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: ncontrols + 2,
                    got: args.len(),
                });
            }
            if args.iter().any(|arg| arg.1 > 1) {
                return Err(ParseError::CtrlRegisterUnsupported);
            }
            let controls: Vec<Control> = args[..ncontrols]
                .iter()
                .map(|arg| Control::pos(arg.0))
                .collect();
            self.circuit.update_max_controls(ncontrols as u16);
            return Ok(StandardOperation::two_target(
                total,
                controls,
                args[ncontrols].0,
                args[ncontrols + 1].0,
                OpKind::Swap,
            )
            .into());
        }

        let direct = self.gate_table.get(&name).cloned();
        let inferred = self.gate_table.get(&base).cloned();
        if direct.is_none() && inferred.is_none() {
            return Err(ParseError::UndefinedGate(name));
        }

        let params = if self.consume(&Token::LParen) {
            let params = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.exp_list()?
            };
            self.expect(&Token::RParen)?;
            params
        } else {
            vec![]
        };
        let args = self.arg_list()?;
        self.expect(&Token::Semicolon)?;

        let mut arg_map: FxHashMap<String, Argument> = FxHashMap::default();
        let mut param_map = ParamEnv::default();
        let mut size: u16 = 1;

        if let Some(def) = &direct {
            if def.argument_names.len() != args.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: def.argument_names.len(),
                    got: args.len(),
                });
            }
            if def.parameter_names.len() != params.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: def.parameter_names.len(),
                    got: params.len(),
                });
            }
            for (formal, arg) in def.argument_names.iter().zip(&args) {
                arg_map.insert(formal.clone(), *arg);
                if arg.1 > 1 {
                    if size != 1 && arg.1 != size {
                        return Err(ParseError::RegisterSizeMismatch);
                    }
                    size = arg.1;
                }
            }
            for (formal, param) in def.parameter_names.iter().zip(&params) {
                param_map.insert(formal.clone(), param.clone());
            }
        } else if let Some(def) = &inferred {
            if def.body.len() > 1 {
                // A controlled variant can only be inferred from a
                // single-gate definition.
                return Err(ParseError::UndefinedGate(name));
            }
            if args.len() != ncontrols + def.argument_names.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: ncontrols + def.argument_names.len(),
                    got: args.len(),
                });
            }
            if def.parameter_names.len() != params.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: def.parameter_names.len(),
                    got: params.len(),
                });
            }
            for (i, arg) in args.iter().enumerate() {
                arg_map.insert(format!("q{i}"), *arg);
                if arg.1 > 1 {
                    if size != 1 && arg.1 != size {
                        return Err(ParseError::RegisterSizeMismatch);
                    }
                    size = arg.1;
                }
            }
            for (formal, param) in def.parameter_names.iter().zip(&params) {
                param_map.insert(formal.clone(), param.clone());
            }
        }

        // Single emitted op with synthesised controls. A gate with a direct
        // definition always expands its own body instead.
        if ncontrols > 0 && size == 1 && direct.is_none() {
            if let Some(cdef) = &inferred {
                if cdef.body.len() == 1 {
                    let mut controls = Vec::with_capacity(ncontrols);
                    for j in 0..ncontrols {
                        let key = format!("q{j}");
                        controls.push(Control::pos(lookup_arg(&arg_map, &key)?.0));
                    }
                    let target = lookup_arg(&arg_map, &format!("q{ncontrols}"))?.0;

                    // Multi-controlled X needs no parameter rewriting.
                    if base == "x" && ncontrols > 1 {
                        return Ok(
                            StandardOperation::controlled(total, controls, target, OpKind::X)
                                .into(),
                        );
                    }

                    return match &cdef.body[0] {
                        BodyGate::U {
                            theta,
                            phi,
                            lambda,
                            ..
                        } => {
                            let theta = rewritten(theta, &param_map)?;
                            let phi = rewritten(phi, &param_map)?;
                            let lambda = rewritten(lambda, &param_map)?;
                            Ok(StandardOperation::u3(total, controls, target, lambda, phi, theta)
                                .into())
                        }
                        _ => Err(ParseError::UndefinedGate(name)),
                    };
                }
            }
        }

        let Some(def) = direct else {
            // Controlled inference cannot broadcast over registers.
            return Err(ParseError::CtrlRegisterUnsupported);
        };

        // Single-gate definitions collapse to one standard operation.
        if def.body.len() == 1 {
            match &def.body[0] {
                BodyGate::U {
                    theta,
                    phi,
                    lambda,
                    target,
                } => {
                    let slice = lookup_arg(&arg_map, target)?;
                    if slice.1 == 1 {
                        let theta = rewritten(theta, &param_map)?;
                        let phi = rewritten(phi, &param_map)?;
                        let lambda = rewritten(lambda, &param_map)?;
                        return Ok(StandardOperation::u3(
                            total,
                            vec![],
                            slice.0,
                            lambda,
                            phi,
                            theta,
                        )
                        .into());
                    }
                }
                BodyGate::Cx { control, target } => {
                    let control = lookup_arg(&arg_map, control)?;
                    let target = lookup_arg(&arg_map, target)?;
                    if control.1 == 1 && target.1 == 1 {
                        check_control_target_overlap(control, target)?;
                        return Ok(StandardOperation::controlled(
                            total,
                            vec![Control::pos(control.0)],
                            target.0,
                            OpKind::X,
                        )
                        .into());
                    }
                }
                _ => {}
            }
        }

        // General case: expand the whole body into a compound operation.
        let mut compound = CompoundOperation::new(total);
        for body_gate in &def.body {
            match body_gate {
                BodyGate::U {
                    theta,
                    phi,
                    lambda,
                    target,
                } => {
                    let slice = lookup_arg(&arg_map, target)?;
                    let theta = rewritten(theta, &param_map)?;
                    let phi = rewritten(phi, &param_map)?;
                    let lambda = rewritten(lambda, &param_map)?;
                    for j in 0..slice.1 {
                        compound.push(StandardOperation::u3(
                            total,
                            vec![],
                            slice.0 + j,
                            lambda,
                            phi,
                            theta,
                        ));
                    }
                }
                BodyGate::Cx { control, target } => {
                    let control = lookup_arg(&arg_map, control)?;
                    let target = lookup_arg(&arg_map, target)?;
                    check_control_target_overlap(control, target)?;
                    broadcast_cx(&mut compound, total, control, target)?;
                }
                BodyGate::Mcx { controls, target } => {
                    let target_slice = lookup_arg(&arg_map, target)?;
                    let controls =
                        resolve_control_list(&arg_map, controls, target_slice)?;
                    if target_slice.1 != 1 {
                        return Err(ParseError::CtrlRegisterUnsupported);
                    }
                    compound.push(StandardOperation::controlled(
                        total,
                        controls,
                        target_slice.0,
                        OpKind::X,
                    ));
                }
                BodyGate::Cu {
                    theta,
                    phi,
                    lambda,
                    controls,
                    target,
                } => {
                    let target_slice = lookup_arg(&arg_map, target)?;
                    let controls =
                        resolve_control_list(&arg_map, controls, target_slice)?;
                    if target_slice.1 != 1 {
                        return Err(ParseError::CtrlRegisterUnsupported);
                    }
                    let theta = rewritten(theta, &param_map)?;
                    let phi = rewritten(phi, &param_map)?;
                    let lambda = rewritten(lambda, &param_map)?;
                    compound.push(StandardOperation::u3(
                        total,
                        controls,
                        target_slice.0,
                        lambda,
                        phi,
                        theta,
                    ));
                }
            }
        }
        Ok(compound.into())
    }

    /// Parse a `gate name(params) args { body }` declaration.
    ///
    /// The declaration is skipped entirely when the name is a controlled
    /// spelling of a gate that already has a single-gate definition; those
    /// call sites use controlled inference instead.
    pub(crate) fn gate_decl(&mut self) -> ParseResult<()> {
        self.expect(&Token::Gate)?;
        let name = self.expect_identifier()?;

        let parameter_names = if self.consume(&Token::LParen) {
            let names = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.id_list()?
            };
            self.expect(&Token::RParen)?;
            names
        } else {
            vec![]
        };
        let argument_names = self.id_list()?;
        self.expect(&Token::LBrace)?;

        let base = strip_controls(&name).0.to_string();
        if let Some(existing) = self.gate_table.get(&base) {
            if existing.body.len() <= 1 {
                // The inlined expansion already exists; skip the declaration.
                loop {
                    match self.advance() {
                        Some(tok) if tok.token == Token::RBrace => return Ok(()),
                        Some(_) => {}
                        None => return Err(ParseError::UnexpectedEof("}".into())),
                    }
                }
            }
        }

        let mut def = GateDef {
            parameter_names,
            argument_names,
            body: vec![],
        };

        while !self.check(&Token::RBrace) {
            match self.peek() {
                Some(Token::UGate) => {
                    self.advance();
                    self.expect(&Token::LParen)?;
                    let theta = self.parse_exp()?;
                    self.expect(&Token::Comma)?;
                    let phi = self.parse_exp()?;
                    self.expect(&Token::Comma)?;
                    let lambda = self.parse_exp()?;
                    self.expect(&Token::RParen)?;
                    let target = self.expect_identifier()?;
                    self.expect(&Token::Semicolon)?;
                    def.body.push(BodyGate::U {
                        theta,
                        phi,
                        lambda,
                        target,
                    });
                }
                Some(Token::CxGate) => {
                    self.advance();
                    let control = self.expect_identifier()?;
                    self.expect(&Token::Comma)?;
                    let target = self.expect_identifier()?;
                    self.expect(&Token::Semicolon)?;
                    def.body.push(BodyGate::Cx { control, target });
                }
                Some(Token::Identifier(_)) => self.inline_body_call(&mut def)?,
                Some(Token::Barrier) => {
                    // Barriers inside declarations carry no semantics here.
                    self.advance();
                    self.id_list()?;
                    self.expect(&Token::Semicolon)?;
                }
                _ => return self.syntax_error("error in gate declaration"),
            }
        }
        self.expect(&Token::RBrace)?;
        self.gate_table.insert(name, def);
        Ok(())
    }

    /// Inline a gate call inside a declaration body against the table.
    fn inline_body_call(&mut self, def: &mut GateDef) -> ParseResult<()> {
        let name = self.expect_identifier()?;
        let (base, ncontrols) = {
            let (base, n) = strip_controls(&name);
            (base.to_string(), n)
        };

        let direct = self.gate_table.get(&name).cloned();
        let inferred = self.gate_table.get(&base).cloned();
        if direct.is_none() && inferred.is_none() {
            return Err(ParseError::UndefinedGate(name));
        }

        let params = if self.consume(&Token::LParen) {
            let params = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.exp_list()?
            };
            self.expect(&Token::RParen)?;
            params
        } else {
            vec![]
        };
        let args = self.id_list()?;
        self.expect(&Token::Semicolon)?;

        if let Some(inner) = direct {
            if inner.argument_names.len() != args.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: inner.argument_names.len(),
                    got: args.len(),
                });
            }
            if inner.parameter_names.len() != params.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: inner.parameter_names.len(),
                    got: params.len(),
                });
            }

            let mut arg_map: FxHashMap<String, String> = FxHashMap::default();
            for (formal, actual) in inner.argument_names.iter().zip(&args) {
                arg_map.insert(formal.clone(), actual.clone());
            }
            let mut param_map = ParamEnv::default();
            for (formal, param) in inner.parameter_names.iter().zip(&params) {
                param_map.insert(formal.clone(), param.clone());
            }

            for body_gate in &inner.body {
                def.body.push(map_body_gate(body_gate, &arg_map, &param_map)?);
            }
        } else if let Some(inner) = inferred {
            if inner.body.len() != 1 {
                return Err(ParseError::UndefinedGate(name));
            }
            if args.len() != ncontrols + 1 {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: ncontrols + 1,
                    got: args.len(),
                });
            }
            if inner.parameter_names.len() != params.len() {
                return Err(ParseError::ArgumentCountMismatch {
                    expected: inner.parameter_names.len(),
                    got: params.len(),
                });
            }

            let mut param_map = ParamEnv::default();
            for (formal, param) in inner.parameter_names.iter().zip(&params) {
                param_map.insert(formal.clone(), param.clone());
            }

            let controls = args[..args.len() - 1].to_vec();
            let target = args[args.len() - 1].clone();
            if base == "x" {
                def.body.push(BodyGate::Mcx { controls, target });
            } else {
                match &inner.body[0] {
                    BodyGate::U {
                        theta,
                        phi,
                        lambda,
                        ..
                    } => def.body.push(BodyGate::Cu {
                        theta: rewrite(theta, &param_map),
                        phi: rewrite(phi, &param_map),
                        lambda: rewrite(lambda, &param_map),
                        controls,
                        target,
                    }),
                    _ => return Err(ParseError::UndefinedGate(name)),
                }
            }
        }
        Ok(())
    }

    /// Parse an `opaque` declaration and register it with an empty body.
    pub(crate) fn opaque_decl(&mut self) -> ParseResult<()> {
        self.expect(&Token::Opaque)?;
        let name = self.expect_identifier()?;

        let parameter_names = if self.consume(&Token::LParen) {
            let names = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.id_list()?
            };
            self.expect(&Token::RParen)?;
            names
        } else {
            vec![]
        };
        let argument_names = self.id_list()?;
        self.expect(&Token::Semicolon)?;

        self.gate_table.insert(
            name,
            GateDef {
                parameter_names,
                argument_names,
                body: vec![],
            },
        );
        Ok(())
    }
}

fn lookup_arg(arg_map: &FxHashMap<String, Argument>, name: &str) -> ParseResult<Argument> {
    arg_map
        .get(name)
        .copied()
        .ok_or_else(|| ParseError::UnknownRegister(name.to_string()))
}

/// Rewrite a body gate of an inlined definition into the outer declaration's
/// formal names.
fn map_body_gate(
    gate: &BodyGate,
    arg_map: &FxHashMap<String, String>,
    param_map: &ParamEnv,
) -> ParseResult<BodyGate> {
    let mapped = |name: &String| -> ParseResult<String> {
        arg_map
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::UnknownRegister(name.clone()))
    };

    Ok(match gate {
        BodyGate::U {
            theta,
            phi,
            lambda,
            target,
        } => BodyGate::U {
            theta: rewrite(theta, param_map),
            phi: rewrite(phi, param_map),
            lambda: rewrite(lambda, param_map),
            target: mapped(target)?,
        },
        BodyGate::Cx { control, target } => BodyGate::Cx {
            control: mapped(control)?,
            target: mapped(target)?,
        },
        BodyGate::Cu {
            theta,
            phi,
            lambda,
            controls,
            target,
        } => BodyGate::Cu {
            theta: rewrite(theta, param_map),
            phi: rewrite(phi, param_map),
            lambda: rewrite(lambda, param_map),
            controls: controls.iter().map(&mapped).collect::<ParseResult<_>>()?,
            target: mapped(target)?,
        },
        BodyGate::Mcx { controls, target } => BodyGate::Mcx {
            controls: controls.iter().map(&mapped).collect::<ParseResult<_>>()?,
            target: mapped(target)?,
        },
    })
}

/// Resolve a formal control list, rejecting register-valued or duplicate
/// controls and control/target collisions.
fn resolve_control_list(
    arg_map: &FxHashMap<String, Argument>,
    controls: &[String],
    target: Argument,
) -> ParseResult<Vec<Control>> {
    let mut resolved = Vec::with_capacity(controls.len());
    for control in controls {
        let slice = lookup_arg(arg_map, control)?;
        if slice.1 != 1 {
            return Err(ParseError::CtrlRegisterUnsupported);
        }
        if slice == target {
            return Err(ParseError::DuplicateQubit(target.0));
        }
        if controls.iter().filter(|c| *c == control).count() > 1 {
            return Err(ParseError::DuplicateQubit(slice.0));
        }
        resolved.push(Control::pos(slice.0));
    }
    Ok(resolved)
}

/// Qubits may not appear on both sides of a CX.
fn check_control_target_overlap(control: Argument, target: Argument) -> ParseResult<()> {
    for i in 0..control.1 {
        for j in 0..target.1 {
            if control.0 + i == target.0 + j {
                return Err(ParseError::DuplicateQubit(control.0 + i));
            }
        }
    }
    Ok(())
}

/// Emit the broadcast shapes `(1,1)`, `(s,s)`, `(1,s)`, `(s,1)` for CX.
fn broadcast_cx(
    compound: &mut CompoundOperation,
    total: alsvid_ir::Qubit,
    control: Argument,
    target: Argument,
) -> ParseResult<()> {
    if control.1 == 1 && target.1 == 1 {
        compound.push(StandardOperation::controlled(
            total,
            vec![Control::pos(control.0)],
            target.0,
            OpKind::X,
        ));
    } else if control.1 == target.1 {
        for i in 0..target.1 {
            compound.push(StandardOperation::controlled(
                total,
                vec![Control::pos(control.0 + i)],
                target.0 + i,
                OpKind::X,
            ));
        }
    } else if control.1 == 1 {
        for i in 0..target.1 {
            compound.push(StandardOperation::controlled(
                total,
                vec![Control::pos(control.0)],
                target.0 + i,
                OpKind::X,
            ));
        }
    } else if target.1 == 1 {
        for i in 0..control.1 {
            compound.push(StandardOperation::controlled(
                total,
                vec![Control::pos(control.0 + i)],
                target.0,
                OpKind::X,
            ));
        }
    } else {
        return Err(ParseError::RegisterSizeMismatch);
    }
    Ok(())
}
