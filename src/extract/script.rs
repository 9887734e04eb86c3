//! Script dialect extractor: JSX/TSX/JS/TS parsing via swc.

use std::collections::BTreeMap;
use std::sync::Arc;

use swc_common::{FileName, GLOBALS, Globals, SourceMap, Spanned};
use swc_ecma_ast::*;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

use crate::diagnostics::{Diagnostic, SourceLocation};
use crate::source_index::SourceIndex;
use crate::var_graph::extract_var_refs;

use super::annotations::scan_annotations;
use super::shared::{ExtractionResult, looks_like_class_identifier};

const CLASS_ATTR_NAMES: &[&str] = &["class", "className"];

pub fn extract(file: &str, source: &str) -> ExtractionResult {
    let index = SourceIndex::new(file, source);
    let mut result = ExtractionResult::default();
    scan_annotations(source, &index, &mut result);

    let syntax = syntax_for(file);
    let source_map: Arc<SourceMap> = Arc::new(SourceMap::default());
    let parsed = GLOBALS.set(&Globals::new(), || {
        let source_file =
            source_map.new_source_file(FileName::Real(file.into()).into(), source.to_string());
        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
        parser.parse_module()
    });

    let module = match parsed {
        Ok(module) => module,
        Err(e) => {
            result.diagnostics.push(Diagnostic::parse_error(
                format!("{:?}", e),
                SourceLocation::new(file, 1, 1),
            ));
            return result;
        }
    };

    let mut collector = ClassCollector {
        file,
        source_map: &source_map,
        identifiers: BTreeMap::new(),
        result: &mut result,
    };
    module.visit_with(&mut collector);
    result
}

fn syntax_for(file: &str) -> Syntax {
    if file.ends_with(".tsx") {
        Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        })
    } else if file.ends_with(".ts") {
        Syntax::Typescript(TsSyntax::default())
    } else {
        // .js and .jsx share a syntax: JSX is commonly authored in plain
        // `.js` files too, and swc accepts non-JSX input under this mode.
        Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        })
    }
}

struct ClassCollector<'a> {
    file: &'a str,
    source_map: &'a SourceMap,
    /// Identifiers whose naming convention marks them as class-name
    /// holders, mapped to the literal class tokens their initializer
    /// resolved to. Populated only from a direct literal initializer —
    /// `let b = a` never makes `b` an alias of whatever `a` holds.
    identifiers: BTreeMap<String, Vec<String>>,
    result: &'a mut ExtractionResult,
}

impl<'a> ClassCollector<'a> {
    fn location(&self, pos: swc_common::BytePos) -> SourceLocation {
        let loc = self.source_map.lookup_char_pos(pos);
        SourceLocation::new(self.file, loc.line, loc.col_display + 1)
    }

    /// Resolve `expr` into the class-name tokens it statically contributes:
    /// string literals, array literals, the truthy side of `&&`, both sides
    /// of a ternary, object-literal keys (`clsx({ active: x }`-style),
    /// arguments of any bare-identifier call (covers `clsx`/`cx` and any
    /// project-specific helper with the same shape), reactive `$`-prefixed
    /// wrapper calls, and identifiers previously registered by naming
    /// convention.
    fn collect_class_tokens(&self, expr: &Expr) -> Vec<String> {
        match expr {
            Expr::Lit(Lit::Str(s)) => s
                .value
                .as_str()
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            Expr::Tpl(tpl) => tpl
                .quasis
                .iter()
                .map(|q| q.raw.as_str())
                .flat_map(str::split_whitespace)
                .map(str::to_string)
                .collect(),
            Expr::Array(arr) => arr
                .elems
                .iter()
                .flatten()
                .flat_map(|e| self.collect_class_tokens(&e.expr))
                .collect(),
            Expr::Bin(bin) if bin.op == BinaryOp::LogicalAnd => {
                self.collect_class_tokens(&bin.right)
            }
            Expr::Cond(cond) => {
                let mut out = self.collect_class_tokens(&cond.cons);
                out.extend(self.collect_class_tokens(&cond.alt));
                out
            }
            Expr::Paren(paren) => self.collect_class_tokens(&paren.expr),
            Expr::Object(obj) => obj
                .props
                .iter()
                .filter_map(|p| match p {
                    PropOrSpread::Prop(prop) => match &**prop {
                        Prop::KeyValue(kv) => match &kv.key {
                            PropName::Ident(ident) => Some(ident.sym.to_string()),
                            PropName::Str(s) => s.value.as_str().map(str::to_string),
                            _ => None,
                        },
                        _ => None,
                    },
                    _ => None,
                })
                .collect(),
            Expr::Call(call) => {
                let Callee::Expr(callee) = &call.callee else {
                    return Vec::new();
                };
                let Expr::Ident(ident) = &**callee else {
                    return Vec::new();
                };
                let name = ident.sym.as_str();
                if name.starts_with('$') {
                    // Reactive wrapper call (e.g. Svelte 5's `$derived(...)`):
                    // transparent, so trace into its first argument.
                    return call
                        .args
                        .first()
                        .map(|a| self.collect_class_tokens(&a.expr))
                        .unwrap_or_default();
                }
                // Any other bare-identifier call is treated as a utility
                // call: its positional string/array/object-keyed arguments
                // are scanned the same way, with no name allowlist — a
                // project's own helper has the same shape as `clsx`/`cx`.
                call.args
                    .iter()
                    .flat_map(|a| self.collect_class_tokens(&a.expr))
                    .collect()
            }
            Expr::Ident(ident) => self
                .identifiers
                .get(ident.sym.as_str())
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Like `collect_class_tokens`, but for naming-convention variable
    /// initializers: string/array/conditional/reactive-wrapper forms only.
    /// No `Expr::Ident` branch and no object-key or call-argument scanning —
    /// a naming-convention variable's contributed tokens come only from its
    /// own literal shape, never from resolving another identifier, so
    /// `const b = a;` never makes `b` a transitive alias of `a`.
    fn collect_literal_tokens(&self, expr: &Expr) -> Vec<String> {
        match expr {
            Expr::Lit(Lit::Str(s)) => s
                .value
                .as_str()
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            Expr::Tpl(tpl) => tpl
                .quasis
                .iter()
                .map(|q| q.raw.as_str())
                .flat_map(str::split_whitespace)
                .map(str::to_string)
                .collect(),
            Expr::Array(arr) => arr
                .elems
                .iter()
                .flatten()
                .flat_map(|e| self.collect_literal_tokens(&e.expr))
                .collect(),
            Expr::Bin(bin) if bin.op == BinaryOp::LogicalAnd => {
                self.collect_literal_tokens(&bin.right)
            }
            Expr::Cond(cond) => {
                let mut out = self.collect_literal_tokens(&cond.cons);
                out.extend(self.collect_literal_tokens(&cond.alt));
                out
            }
            Expr::Paren(paren) => self.collect_literal_tokens(&paren.expr),
            Expr::Call(call) => {
                let Callee::Expr(callee) = &call.callee else {
                    return Vec::new();
                };
                let Expr::Ident(ident) = &**callee else {
                    return Vec::new();
                };
                if !ident.sym.as_str().starts_with('$') {
                    return Vec::new();
                }
                call.args
                    .first()
                    .map(|a| self.collect_literal_tokens(&a.expr))
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }
}

impl<'a> Visit for ClassCollector<'a> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(binding) = &node.name {
            let name = binding.id.sym.to_string();
            if looks_like_class_identifier(&name) {
                if let Some(init) = &node.init {
                    if matches!(&**init, Expr::Ident(_)) {
                        // Bound to another identifier, not a literal: record
                        // the alias without resolving it to any classes.
                        self.result.tracked_vars.insert(name);
                    } else {
                        let tokens = self.collect_literal_tokens(init);
                        if !tokens.is_empty() {
                            self.identifiers.insert(name, tokens);
                        }
                    }
                }
            }
        }
        node.visit_children_with(self);
    }

    fn visit_str(&mut self, node: &Str) {
        if let Some(value) = node.value.as_str() {
            if value.contains("var(--") {
                self.result.css_variables.extend(extract_var_refs(value));
            }
        }
        node.visit_children_with(self);
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        for quasi in &node.quasis {
            let raw = quasi.raw.as_str();
            if raw.contains("var(--") {
                self.result.css_variables.extend(extract_var_refs(raw));
            }
        }
        node.visit_children_with(self);
    }

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        let attr_name = match &node.name {
            JSXAttrName::Ident(ident) => ident.sym.to_string(),
            JSXAttrName::JSXNamespacedName(ns) => format!("{}-{}", ns.ns.sym, ns.name.sym),
        };

        if CLASS_ATTR_NAMES.contains(&attr_name.as_str()) {
            match &node.value {
                Some(JSXAttrValue::Str(s)) => {
                    let loc = self.location(s.span.lo);
                    if let Some(value) = s.value.as_str() {
                        for token in value.split_whitespace() {
                            self.result.add_class(token.to_string(), loc.clone());
                        }
                    }
                }
                Some(JSXAttrValue::JSXExprContainer(container)) => {
                    if let JSXExpr::Expr(expr) = &container.expr {
                        let loc = self.location(expr.span().lo);
                        for token in self.collect_class_tokens(expr) {
                            self.result.add_class(token, loc.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        node.visit_children_with(self);
    }
}
