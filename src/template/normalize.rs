//! Redundant-return normalization.
//!
//! Template inlining leaves behind `return;` statements that are pure
//! tail-control artifacts: control would fall through to the same point
//! anyway. This pass removes a bare return when it is the last statement of
//! the body, and recursively when it is the last statement of every branch
//! of a tail-position `if`/`else` or exhaustive `switch`. Value returns are
//! never removed, and a bare return inside a non-exhaustive construct is
//! kept.

use super::syntax::RtStmt;

/// Normalize an expanded body, removing trivially redundant trailing
/// bare returns.
pub fn normalize_returns(mut stmts: Vec<RtStmt>) -> Vec<RtStmt> {
    strip_tail(&mut stmts);
    stmts
}

fn strip_tail(stmts: &mut Vec<RtStmt>) {
    match stmts.last_mut() {
        Some(RtStmt::Return(None)) => {
            tracing::trace!("removed redundant trailing return");
            stmts.pop();
        }
        Some(RtStmt::If { then_branch, else_branch: Some(else_branch), .. }) => {
            strip_tail(then_branch);
            strip_tail(else_branch);
        }
        Some(RtStmt::Switch { arms, exhaustive: true, .. }) => {
            for arm in arms {
                strip_tail(&mut arm.body);
            }
        }
        Some(RtStmt::Block(inner)) => strip_tail(inner),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Name;
    use crate::host::ConstValue;
    use crate::template::syntax::{RtExpr, RtSwitchArm, SwitchLabel};

    fn bare_return() -> RtStmt {
        RtStmt::Return(None)
    }

    fn value_return() -> RtStmt {
        RtStmt::Return(Some(RtExpr::Literal(ConstValue::Int(1))))
    }

    fn call(name: &str) -> RtStmt {
        RtStmt::Expr(RtExpr::Invocation {
            callee: Box::new(RtExpr::Ident(Name::new(name))),
            type_args: Vec::new(),
            args: Vec::new(),
            aspect_ref: None,
        })
    }

    #[test]
    fn test_trailing_bare_return_removed() {
        let out = normalize_returns(vec![call("Log"), bare_return()]);
        assert_eq!(out, vec![call("Log")]);
    }

    #[test]
    fn test_value_return_kept() {
        let out = normalize_returns(vec![call("Log"), value_return()]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_mid_body_return_kept() {
        let out = normalize_returns(vec![bare_return(), call("Log")]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_if_else_branches_stripped() {
        let stmts = vec![RtStmt::If {
            cond: RtExpr::Ident(Name::new("flag")),
            then_branch: vec![call("A"), bare_return()],
            else_branch: Some(vec![call("B"), bare_return()]),
        }];
        let out = normalize_returns(stmts);
        let RtStmt::If { then_branch, else_branch, .. } = &out[0] else {
            panic!("expected if");
        };
        assert_eq!(then_branch.len(), 1);
        assert_eq!(else_branch.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_if_without_else_untouched() {
        let stmts = vec![RtStmt::If {
            cond: RtExpr::Ident(Name::new("flag")),
            then_branch: vec![bare_return()],
            else_branch: None,
        }];
        let out = normalize_returns(stmts.clone());
        assert_eq!(out, stmts);
    }

    #[test]
    fn test_exhaustive_switch_arms_stripped() {
        let arm = |label, body| RtSwitchArm { label, body };
        let stmts = vec![RtStmt::Switch {
            scrutinee: RtExpr::Ident(Name::new("state")),
            arms: vec![
                arm(SwitchLabel::Const(ConstValue::Int(0)), vec![call("A"), bare_return()]),
                arm(SwitchLabel::Default, vec![bare_return()]),
            ],
            exhaustive: true,
        }];
        let out = normalize_returns(stmts);
        let RtStmt::Switch { arms, .. } = &out[0] else { panic!("expected switch") };
        assert_eq!(arms[0].body, vec![call("A")]);
        assert!(arms[1].body.is_empty());
    }

    #[test]
    fn test_non_exhaustive_switch_kept() {
        let stmts = vec![RtStmt::Switch {
            scrutinee: RtExpr::Ident(Name::new("state")),
            arms: vec![RtSwitchArm {
                label: SwitchLabel::Const(ConstValue::Int(0)),
                body: vec![bare_return()],
            }],
            exhaustive: false,
        }];
        let out = normalize_returns(stmts.clone());
        assert_eq!(out, stmts);
    }

    #[test]
    fn test_if_not_in_tail_position_untouched() {
        let stmts = vec![
            RtStmt::If {
                cond: RtExpr::Ident(Name::new("flag")),
                then_branch: vec![bare_return()],
                else_branch: Some(vec![bare_return()]),
            },
            call("After"),
        ];
        let out = normalize_returns(stmts.clone());
        assert_eq!(out, stmts);
    }
}
