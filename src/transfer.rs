//! Copying diagrams between managers.
//!
//! Variables are matched by index, not by level: variable `x3` of the source
//! becomes variable `x3` of the destination, which is created if missing.
//! The destination may order its variables differently, so nodes are rebuilt
//! bottom-up with the destination's own `ite`/`union` rather than copied.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::DdResult;
use crate::gc::Pin;
use crate::handle::{Diagram, DiagramKind};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::BDD_ONE;
use crate::types::{Kind, NodeId};
use crate::zdd::{ZddOp, ZddVarOp};

impl Core {
    fn copy_into<'d>(&self, dest: &'d Core, kind: Kind, r: Ref, memo: &mut HashMap<NodeId, Pin<'d>>) -> DdResult<Ref> {
        trace!("copy_into(kind = {}, r = {})", kind, r);
        let negated = kind == Kind::Bdd && r.is_negated();
        let regular = if negated { -r } else { r };

        let node = *self.forest(kind).table.borrow().node(regular.id());
        if node.is_terminal() {
            return match kind {
                Kind::Bdd => Ok(BDD_ONE.negate_if(negated)),
                Kind::Add => dest.constant(node.value),
                Kind::Zdd => Ok(r),
            };
        }
        if let Some(p) = memo.get(&regular.id()) {
            return Ok(p.get().negate_if(negated));
        }
        dest.check_limits()?;

        let t = self.copy_into(dest, kind, node.high, memo)?;
        let t = dest.pin(kind, t);
        let e = self.copy_into(dest, kind, node.low, memo)?;
        let e = dest.pin(kind, e);
        dest.ensure_var(kind.space(), node.var)?;

        let res = match kind {
            Kind::Bdd => {
                let x = dest.bdd_var(node.var)?;
                let x = dest.pin(kind, x);
                dest.bdd_ite(x.get(), t.get(), e.get())?
            }
            Kind::Add => {
                let x = dest.add_var(node.var)?;
                let x = dest.pin(kind, x);
                dest.add_ite(x.get(), t.get(), e.get())?
            }
            Kind::Zdd => {
                let with_var = dest.zdd_var_op(ZddVarOp::Change, t.get(), node.var)?;
                let with_var = dest.pin(kind, with_var);
                dest.zdd_apply(ZddOp::Union, with_var.get(), e.get())?
            }
        };
        memo.insert(regular.id(), dest.pin(kind, res));
        Ok(res.negate_if(negated))
    }
}

impl Manager {
    /// Rebuilds `f` in `dest`, matching variables by index.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    ///
    /// let src = Manager::new(2, 0, None);
    /// let f = src.xor(&src.var(0).unwrap(), &src.var(1).unwrap()).unwrap();
    ///
    /// let dest = Manager::new(0, 0, None);
    /// let g = src.transfer(&f, &dest).unwrap();
    /// assert_eq!(dest.num_vars(), 2);
    /// assert_eq!(g, dest.xor(&dest.var(0).unwrap(), &dest.var(1).unwrap()).unwrap());
    /// ```
    pub fn transfer<K: DiagramKind>(&self, f: &Diagram<K>, dest: &Manager) -> DdResult<Diagram<K>> {
        let r = self.check(f)?;
        if Rc::ptr_eq(&self.core, &dest.core) {
            return Ok(f.clone());
        }
        let _guard = self.core.enter()?;
        let res = dest.run(|core| self.core.copy_into(core, K::KIND, r, &mut HashMap::new()))?;
        debug!("transferred {} {} into another manager", K::KIND, r);
        Ok(res)
    }
}
