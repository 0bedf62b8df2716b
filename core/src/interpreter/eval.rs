use std::rc::Rc;

use num_bigint::BigInt;

use super::{Closure, Control, Flow, Instance, Interpreter, Pending, RunError, Value, builtins};
use crate::ast::{Catch, Declaration, Expr, ExprKind, Ident, Sequence};
use crate::diagnostics::DiagnosticKind;
use crate::environment::Environment;

impl<'a, 'r> Interpreter<'a, 'r> {
    pub(crate) fn eval_expr(&mut self, expr: &'a Expr<'a>) -> Flow<'a> {
        match expr.kind {
            ExprKind::Int(digits) => digits
                .parse::<BigInt>()
                .map(Value::Int)
                .map_err(|_| RunError::InvalidLiteral(digits.to_string()).into()),
            ExprKind::Bool(b) => Ok(Value::Bool(b)),
            ExprKind::Char(c) => Ok(Value::Char(c)),
            ExprKind::Void => Ok(Value::Void),
            ExprKind::Ident(ident) => self.eval_ident(expr, ident),
            ExprKind::Binary { op, left, right } => self.eval_binary(expr, op, left, right),
            ExprKind::Assign { target, value } => {
                let value = copied(self.eval_expr(value)?);
                self.assign(target, value.clone())?;
                Ok(value)
            }
            ExprKind::Declaration(decl) => self.eval_declaration(decl),
            ExprKind::Array(items) => Ok(Value::array(self.eval_all(items)?)),
            ExprKind::Function(def) => Ok(Value::Function(Closure {
                def,
                env: self.env.clone(),
            })),
            ExprKind::Struct(def) => Ok(Value::Template(def)),
            ExprKind::New(inner) => self.eval_new(expr, inner),
            ExprKind::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval_condition(test)? {
                    self.eval_sequence(then)
                } else if let Some(otherwise) = otherwise {
                    self.eval_sequence(otherwise)
                } else {
                    Ok(Value::Void)
                }
            }
            ExprKind::Apply { callee, args } => self.eval_apply(expr, callee, args),
            ExprKind::Import(inner) => self.eval_import(inner, None),
            ExprKind::Goto(_) | ExprKind::Label(_) => {
                self.emit(DiagnosticKind::UnsupportedStatement, expr, &[expr])?;
                Ok(Value::Void)
            }
            ExprKind::Break(guard) => match self.guard_holds(guard)? {
                true => Err(Control::Break),
                false => Ok(Value::Void),
            },
            ExprKind::Continue(guard) => match self.guard_holds(guard)? {
                true => Err(Control::Continue),
                false => Ok(Value::Void),
            },
            ExprKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expr(value)?,
                    None => Value::Void,
                };
                Err(Control::Return(value))
            }
            ExprKind::Repeat(body) => {
                loop {
                    match self.eval_sequence(body) {
                        Ok(_) | Err(Control::Continue) => {}
                        Err(Control::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::Void)
            }
            ExprKind::ForEach {
                binding,
                iterable,
                body,
            } => self.eval_foreach(binding, iterable, body),
            ExprKind::Throw(inner) => {
                let thrown = self.eval_expr(inner)?;
                Err(Control::Throw(thrown))
            }
            ExprKind::Try {
                body,
                catch,
                finally,
            } => self.eval_try(body, catch, finally),
            ExprKind::Assume(inner) => {
                if !holds(&self.eval_expr(inner)?) {
                    self.emit(DiagnosticKind::AssumptionViolated, expr, &[inner])?;
                }
                Ok(Value::Void)
            }
            ExprKind::Assert(inner) => {
                if !holds(&self.eval_expr(inner)?) {
                    self.emit(DiagnosticKind::AssertionFailed, expr, &[inner])?;
                }
                Ok(Value::Void)
            }
            ExprKind::Sequence(body) => self.eval_sequence(body),
            ExprKind::Error => Ok(Value::placeholder(expr)),
        }
    }

    /// Evaluates a block in a fresh child scope.
    pub(crate) fn eval_sequence(&mut self, body: &'a Sequence<'a>) -> Flow<'a> {
        let scope = Environment::child(&self.env);
        self.with_env(scope, |this| this.eval_items(body.items))
    }

    /// Evaluates `items` in the current scope; the last one gives the value.
    pub(super) fn eval_items(&mut self, items: &'a [&'a Expr<'a>]) -> Flow<'a> {
        let Some((last, init)) = items.split_last() else {
            return Ok(Value::Void);
        };
        for item in init {
            if item.is_pure_value() {
                self.emit(DiagnosticKind::NoEffect, item, &[*item])?;
            }
            self.eval_expr(item)?;
        }
        self.eval_expr(last)
    }

    fn eval_all(&mut self, items: &'a [&'a Expr<'a>]) -> Result<Vec<Value<'a>>, Control<'a>> {
        items.iter().map(|item| self.eval_expr(item)).collect()
    }

    fn eval_ident(&mut self, expr: &'a Expr<'a>, ident: Ident<'a>) -> Flow<'a> {
        match self.env.get_value_or_null(ident.name) {
            Some(value) => Ok(value),
            None => {
                self.emit(DiagnosticKind::ImplicitVariable, expr, &[&ident.name])?;
                Ok(Value::placeholder(expr))
            }
        }
    }

    /// `a.b`, `a : T`, and operators resolved through their bindings.
    fn eval_binary(
        &mut self,
        expr: &'a Expr<'a>,
        op: Ident<'a>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> Flow<'a> {
        match op.name {
            "." => {
                let base = self.eval_expr(left)?;
                self.member(left, &base, right)
            }
            ":" => self.eval_expr(left),
            name => {
                let operands = vec![self.eval_expr(left)?, self.eval_expr(right)?];
                let Some(function) = self.env.get_value_or_null(name) else {
                    self.emit(DiagnosticKind::ImplicitVariable, expr, &[&name])?;
                    return Ok(Value::placeholder(expr));
                };
                match function {
                    Value::Function(closure) => self.call_closure(expr, &closure, operands, None),
                    Value::Error(_) => Ok(function),
                    other => Err(RunError::NotCallable(format!("operator {name} ({other})")).into()),
                }
            }
        }
    }

    /// Reads `member` from the value of `base_expr`.
    fn member(
        &mut self,
        base_expr: &'a Expr<'a>,
        base: &Value<'a>,
        member: &'a Expr<'a>,
    ) -> Flow<'a> {
        let name = member_name(member)?;
        match base {
            Value::Instance(instance) => Ok(instance.env.get_member(name)?),
            Value::Template(_) => Err(RunError::UninstantiatedRecord(base_expr.to_string()).into()),
            Value::Error(_) => Ok(base.clone()),
            _ => Err(RunError::NotARecord(base_expr.to_string()).into()),
        }
    }

    fn eval_declaration(&mut self, decl: &'a Declaration<'a>) -> Flow<'a> {
        let value = match decl.init {
            Some(init) => copied(self.eval_expr(init)?),
            None => Value::Void,
        };
        self.env.declare(decl.name.name, value.clone())?;
        Ok(value)
    }

    fn assign(&mut self, target: &'a Expr<'a>, value: Value<'a>) -> Result<(), Control<'a>> {
        match target.kind {
            ExprKind::Binary { op, left, right } if op.name == "." => {
                let name = member_name(right)?;
                match self.eval_expr(left)? {
                    Value::Instance(instance) => instance.env.set_member(name, value)?,
                    Value::Template(_) => {
                        return Err(RunError::UninstantiatedRecord(left.to_string()).into());
                    }
                    Value::Error(_) => {}
                    _ => return Err(RunError::NotARecord(left.to_string()).into()),
                }
            }
            ExprKind::Ident(ident) => {
                if self.env.get_value_or_null(ident.name).is_some() {
                    self.env.set_value(ident.name, value)?;
                } else {
                    self.emit(DiagnosticKind::ImplicitVariable, target, &[&ident.name])?;
                    self.env.declare(ident.name, value)?;
                }
            }
            ExprKind::Declaration(decl) => self.env.declare(decl.name.name, value)?,
            _ => return Err(RunError::InvalidAssignmentTarget(target.to_string()).into()),
        }
        Ok(())
    }

    /// Evaluates a test; anything but a boolean is reported and counts as
    /// false.
    fn eval_condition(&mut self, test: &'a Expr<'a>) -> Result<bool, Control<'a>> {
        match self.eval_expr(test)? {
            Value::Bool(b) => Ok(b),
            _ => {
                self.emit(DiagnosticKind::NonBooleanCondition, test, &[test])?;
                Ok(false)
            }
        }
    }

    fn guard_holds(&mut self, guard: Option<&'a Expr<'a>>) -> Result<bool, Control<'a>> {
        match guard {
            Some(guard) => self.eval_condition(guard),
            None => Ok(true),
        }
    }

    fn eval_foreach(
        &mut self,
        binding: Ident<'a>,
        iterable: &'a Expr<'a>,
        body: &'a Sequence<'a>,
    ) -> Flow<'a> {
        let items = match self.eval_expr(iterable)? {
            Value::Array(items) => items,
            _ => {
                self.emit(DiagnosticKind::NotIterable, iterable, &[iterable])?;
                return Ok(Value::Void);
            }
        };
        for item in items.iter() {
            let scope = Environment::child(&self.env);
            scope.declare(binding.name, item.clone())?;
            match self.with_env(scope, |this| this.eval_sequence(body)) {
                Ok(_) | Err(Control::Continue) => {}
                Err(Control::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(Value::Void)
    }

    fn eval_try(
        &mut self,
        body: &'a Sequence<'a>,
        catch: Option<Catch<'a>>,
        finally: Option<&'a Sequence<'a>>,
    ) -> Flow<'a> {
        let result = match (self.eval_sequence(body), catch) {
            (Err(Control::Throw(thrown)), Some(catch)) => {
                let scope = Environment::child(&self.env);
                if let Some(binding) = catch.binding {
                    scope.declare(binding.name, thrown)?;
                }
                self.with_env(scope, |this| this.eval_sequence(catch.body))
            }
            (result, _) => result,
        };
        if let Some(finally) = finally {
            self.eval_sequence(finally)?;
        }
        result
    }

    fn eval_apply(
        &mut self,
        call: &'a Expr<'a>,
        callee: &'a Expr<'a>,
        args: &'a [&'a Expr<'a>],
    ) -> Flow<'a> {
        if let Some(name) = callee.as_ident().and_then(|ident| ident.builtin_name()) {
            let values = self.eval_all(args)?;
            return Ok(builtins::call(self, name, values)?);
        }

        if let Some((base_expr, member)) = callee.as_member_access() {
            let base = self.eval_expr(base_expr)?;
            if !matches!(
                base,
                Value::Instance(_) | Value::Template(_) | Value::Error(_)
            ) {
                if let Some(extension) = self.extension(member) {
                    let values = self.eval_all(args)?;
                    return self.call_closure(call, &extension, values, Some(base));
                }
            }
            let function = self.member(base_expr, &base, member)?;
            return self.apply_value(call, callee, function, args);
        }

        let function = self.eval_expr(callee)?;
        self.apply_value(call, callee, function, args)
    }

    /// A function with a receiver slot bound to the name of `member`.
    fn extension(&self, member: &'a Expr<'a>) -> Option<Closure<'a>> {
        let name = member.as_ident()?.name;
        match self.env.get_value_or_null(name)? {
            Value::Function(closure) if closure.def.receiver.is_some() => Some(closure),
            _ => None,
        }
    }

    fn apply_value(
        &mut self,
        call: &'a Expr<'a>,
        callee: &'a Expr<'a>,
        function: Value<'a>,
        args: &'a [&'a Expr<'a>],
    ) -> Flow<'a> {
        match function {
            Value::Function(closure) => {
                let values = self.eval_all(args)?;
                self.call_closure(call, &closure, values, None)
            }
            Value::Template(_) | Value::Instance(_) => Ok(Value::Pending(Rc::new(Pending {
                callee: function,
                call,
                args,
            }))),
            Value::Error(_) => Ok(function),
            _ => Err(RunError::NotCallable(callee.to_string()).into()),
        }
    }

    /// Binds arguments to parameters in a frame under the closure's
    /// environment and evaluates the body there.
    pub(super) fn call_closure(
        &mut self,
        call: &'a Expr<'a>,
        closure: &Closure<'a>,
        mut args: Vec<Value<'a>>,
        mut receiver: Option<Value<'a>>,
    ) -> Flow<'a> {
        let def = closure.def;
        let arity = def.params.len();
        if receiver.is_none() && def.receiver.is_some() && args.len() == arity + 1 {
            receiver = args.pop();
        }
        if args.len() > arity {
            self.emit(DiagnosticKind::TooManyArguments, call, &[call, &arity])?;
            args.truncate(arity);
        }
        if args.len() < def.mandatory {
            let missing = def.params[args.len()].name();
            self.emit(DiagnosticKind::NotEnoughArguments, call, &[call, &missing])?;
            args.resize_with(def.mandatory, || Value::placeholder(call));
        }

        let frame = Environment::child(&closure.env);
        let outcome = self.with_env(frame.clone(), |this| {
            let mut supplied = args.into_iter();
            for param in def.params {
                let value = match supplied.next() {
                    Some(value) => copied(value),
                    None => this.default_value(param.default())?,
                };
                frame.declare(param.name(), value)?;
            }
            if let Some(param) = def.receiver {
                let value = match receiver {
                    Some(value) => value,
                    None => this.default_value(param.default())?,
                };
                frame.declare(param.name(), value)?;
            }
            this.eval_sequence(def.body)
        });

        match outcome {
            Err(Control::Return(value)) => Ok(value),
            Err(Control::Break) => Err(RunError::BreakOutsideLoop.into()),
            Err(Control::Continue) => Err(RunError::ContinueOutsideLoop.into()),
            other => other,
        }
    }

    /// Evaluates a parameter default in the parameter frame.
    fn default_value(&mut self, default: Option<&'a Expr<'a>>) -> Flow<'a> {
        match default {
            Some(default) => Ok(copied(self.eval_expr(default)?)),
            None => Ok(Value::Void),
        }
    }

    fn eval_new(&mut self, expr: &'a Expr<'a>, inner: &'a Expr<'a>) -> Flow<'a> {
        // `new T.m` and `new T(args).m` read `m` from the new instance.
        if let Some((base_expr, member)) = inner.as_member_access() {
            let base = self.eval_expr(base_expr)?;
            if is_constructible(&base) {
                let instance = self.construct(expr, base)?;
                return self.member(base_expr, &instance, member);
            }
            let target = self.member(base_expr, &base, member)?;
            return self.construct(expr, target);
        }
        let target = self.eval_expr(inner)?;
        self.construct(expr, target)
    }

    /// Instantiates a struct, running its constructor for `new T(args)`.
    fn construct(&mut self, expr: &'a Expr<'a>, target: Value<'a>) -> Flow<'a> {
        let (template, pending) = match &target {
            Value::Template(template) => (*template, None),
            Value::Pending(pending) => match pending.callee {
                Value::Template(template) => (template, Some(pending.clone())),
                _ => return Err(RunError::NotATemplate(pending.call.to_string()).into()),
            },
            Value::Error(_) => return Ok(target.clone()),
            other => return Err(RunError::NotATemplate(other.to_string()).into()),
        };
        tracing::debug!(line = expr.line, members = template.items.len(), "constructing record");

        let env = Environment::child(&self.global);
        self.with_env(env.clone(), |this| -> Result<(), Control<'a>> {
            for item in template.items {
                match item.kind {
                    ExprKind::Declaration(decl) if decl.mutable => {
                        this.eval_declaration(decl)?;
                    }
                    ExprKind::Declaration(_) => {
                        return Err(RunError::StructMemberNotVariable(item.to_string()).into());
                    }
                    ExprKind::Import(inner) => {
                        this.eval_import(inner, Some(&env))?;
                    }
                    _ => return Err(RunError::InvalidStructItem(item.to_string()).into()),
                }
            }
            Ok(())
        })?;

        if let Some(pending) = pending {
            let Ok(Value::Function(constructor)) = env.get_member("constructor") else {
                return Err(RunError::ConstructorNotFunction(pending.call.to_string()).into());
            };
            let rebound = Closure {
                def: constructor.def,
                env: env.clone(),
            };
            let values = self.eval_all(pending.args)?;
            self.call_closure(pending.call, &rebound, values, None)?;
        }

        Ok(Value::Instance(Instance { template, env }))
    }

    /// Merges a record instance into `target`, the frame under construction.
    fn eval_import(
        &mut self,
        inner: &'a Expr<'a>,
        target: Option<&Environment<'a>>,
    ) -> Flow<'a> {
        let Some(target) = target else {
            self.emit(DiagnosticKind::ImportOutsideConstruction, inner, &[inner])?;
            return Ok(Value::Void);
        };
        match self.eval_expr(inner)? {
            // The target gets its own copy of the imported members.
            Value::Instance(instance) => target.import(&instance.deep_copy().env),
            Value::Template(_) => {
                self.emit(DiagnosticKind::ImportUninstantiated, inner, &[inner])?
            }
            _ => self.emit(DiagnosticKind::ImportNotRecord, inner, &[inner])?,
        }
        Ok(Value::Void)
    }
}

/// Records are copied when bound so that assignment never aliases.
fn copied(value: Value<'_>) -> Value<'_> {
    match value {
        Value::Instance(instance) => Value::Instance(instance.deep_copy()),
        other => other,
    }
}

fn member_name<'a>(member: &'a Expr<'a>) -> Result<&'a str, RunError> {
    member
        .as_ident()
        .map(|ident| ident.name)
        .ok_or_else(|| RunError::ExpectedIdentifier(member.to_string()))
}

/// A checked condition holds when it is `true`, or could not be computed.
fn holds(value: &Value<'_>) -> bool {
    value.is_error() || value.as_bool() == Some(true)
}

fn is_constructible(value: &Value<'_>) -> bool {
    match value {
        Value::Template(_) => true,
        Value::Pending(pending) => matches!(pending.callee, Value::Template(_)),
        _ => false,
    }
}
