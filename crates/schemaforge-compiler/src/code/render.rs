//! Text listing of code models.

use std::fmt::{self, Write};

use super::{
    Block, CodeModel, Cond, Expr, Field, Fragment, Instruction, MapKind, ObjectLiteral, Param,
    TemplatePart, WrapperKind,
};
use schemaforge_core::FieldPath;

struct Renderer<'a> {
    params: &'a [&'static str],
    out: String,
    depth: usize,
}

impl Renderer<'_> {
    fn param(&self, param: Param) -> &'static str {
        match param {
            Param::Entity => self.params.first().copied().unwrap_or("entity"),
            Param::Other => self.params.get(1).copied().unwrap_or("other"),
        }
    }

    fn access(&self, param: Param, path: &FieldPath) -> String {
        if path.is_root() {
            self.param(param).to_owned()
        } else {
            format!("{}.{}", self.param(param), path)
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn block(&mut self, block: &Block) {
        for (name, fragment) in block.iter() {
            self.fragment(name, fragment);
        }
    }

    fn nested(&mut self, open: &str, body: impl FnOnce(&mut Self)) {
        self.line(open);
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self.line("}");
    }

    fn fragment(&mut self, name: &str, fragment: &Fragment) {
        match fragment {
            Fragment::Block(body) => self.nested(&format!("{name} {{"), |r| r.block(body)),
            Fragment::Object(literal) => self.nested(&format!("{name} = {{"), |r| r.object(literal)),
            Fragment::Conditional { cond, body } => {
                let open = format!("if {} {{", self.cond(cond));
                self.nested(&open, |r| r.block(body));
            }
            Fragment::Assign { target, expr } => {
                let text = format!("{} = {}", self.access(Param::Entity, target), self.expr(expr));
                self.line(&text);
            }
            Fragment::Wrapper { kind, body } => {
                let open = match kind {
                    WrapperKind::PauseTracking => "paused_tracking {".to_owned(),
                    WrapperKind::WhenMode(mode) => format!("when mode == {mode:?} {{"),
                };
                self.nested(&open, |r| r.block(body));
            }
            Fragment::Return(expr) => {
                let text = format!("return[{name}] {}", self.expr(expr));
                self.line(&text);
            }
            Fragment::Op(instruction) => {
                let text = match instruction {
                    Instruction::Watch(path) => format!("watch({})", self.access(Param::Entity, path)),
                    Instruction::Freeze(path) => format!("freeze({})", self.access(Param::Entity, path)),
                    Instruction::Protect(path) => format!("protect({})", self.access(Param::Entity, path)),
                    Instruction::AttachMethod { name, helper } => format!("attach({name}, {helper})"),
                };
                self.line(&text);
            }
        }
    }

    fn object(&mut self, literal: &ObjectLiteral) {
        for (key, field) in literal.fields() {
            match field {
                Field::Value(expr) => {
                    let text = format!("{key}: {},", self.expr(expr));
                    self.line(&text);
                }
                Field::Object(nested) => {
                    let guard = if nested.ensure { "always" } else { "if present" };
                    let open = format!(
                        "{key}: {} ({guard}) {{",
                        self.access(nested.param, &nested.read)
                    );
                    self.nested(&open, |r| r.object(&nested.literal));
                }
            }
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Read(param, path) => self.access(*param, path),
            Expr::OrElse(first, second) => format!("{} ?? {}", self.expr(first), self.expr(second)),
            Expr::Default(_) => "default()".to_owned(),
            Expr::Helper(name) => format!("{name}({})", self.param(Param::Entity)),
            Expr::Literal(value) => value.to_json().to_string(),
            Expr::Map { param, path, map } => {
                let target = self.access(*param, path);
                match map {
                    MapKind::Custom(_) => format!("custom({target})"),
                    MapKind::Decode(decoder) if decoder.array => {
                        format!("decode_list<{}>({target})", decoder.ty)
                    }
                    MapKind::Decode(decoder) => format!("decode<{}>({target})", decoder.ty),
                    MapKind::EncodeDate => format!("encode_date({target})"),
                }
            }
            Expr::Template(parts) => {
                let mut text = String::from("`");
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        text.push('|');
                    }
                    let _ = match part {
                        TemplatePart::Value(path) => write!(text, "${{{}}}", self.access(Param::Entity, path)),
                        TemplatePart::Key(path) => write!(text, "${{json({})}}", self.access(Param::Entity, path)),
                        TemplatePart::Date(path) => write!(text, "${{iso({})}}", self.access(Param::Entity, path)),
                    };
                }
                text.push('`');
                text
            }
            Expr::Equals(path) => format!(
                "{} == {}",
                self.access(Param::Entity, path),
                self.access(Param::Other, path)
            ),
            Expr::All(terms) => self.join(terms, " && ", "true"),
            Expr::Any(terms) => self.join(terms, " || ", "false"),
            Expr::Test(cond) => self.cond(cond),
            Expr::List(items) => format!(
                "[{}]",
                items.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    fn join(&self, terms: &[Expr], separator: &str, empty: &str) -> String {
        if terms.is_empty() {
            return empty.to_owned();
        }
        terms
            .iter()
            .map(|e| self.expr(e))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn cond(&self, cond: &Cond) -> String {
        match cond {
            Cond::Exists(param, path) => format!("has({})", self.access(*param, path)),
            Cond::Present(param, path) => format!("{} != null", self.access(*param, path)),
            Cond::Missing(param, path) => format!("{} == null", self.access(*param, path)),
            Cond::IsNull(param, path) => format!("{} === null", self.access(*param, path)),
            Cond::All(conds) => conds
                .iter()
                .map(|c| self.cond(c))
                .collect::<Vec<_>>()
                .join(" && "),
        }
    }
}

impl fmt::Display for CodeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.operation.params();
        let mut renderer = Renderer {
            params,
            out: String::new(),
            depth: 1,
        };
        renderer.block(&self.root);
        writeln!(f, "fn {}({}) {{", self.operation, params.join(", "))?;
        for name in self.helpers.keys() {
            writeln!(f, "  helper {name}")?;
        }
        f.write_str(&renderer.out)?;
        f.write_str("}")
    }
}

impl fmt::Debug for CodeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let renderer = Renderer {
            params: &["entity", "other"],
            out: String::new(),
            depth: 0,
        };
        f.write_str(&renderer.expr(self))
    }
}
