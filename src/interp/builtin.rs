//! The built-in function registry.
//!
//! Built-ins are registered once, process-wide, in a table mapping the
//! script-visible name to its argument bounds and handler. The evaluator
//! checks the argument count here before dispatching.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::interp::builtins::{arith, gnode, list, person, report, seq, strings, table};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::PValue;
use crate::interp::ScriptError;

/// The signature shared by every built-in handler.
pub type BuiltinFn = fn(&mut Context, &PNode, &[PNode]) -> Result<PValue, ScriptError>;

/// One registered built-in.
pub struct Builtin {
    /// The script-visible name.
    pub name: &'static str,
    /// Minimum accepted argument count.
    pub min_args: usize,
    /// Maximum accepted argument count.
    pub max_args: usize,
    /// The handler.
    pub handler: BuiltinFn,
}

macro_rules! builtin {
    ($name:literal, $min:literal, $max:literal, $handler:path) => {
        Builtin {
            name: $name,
            min_args: $min,
            max_args: $max,
            handler: $handler,
        }
    };
}

static BUILTINS: &[Builtin] = &[
    // Arithmetic and logic.
    builtin!("add", 2, 2, arith::add),
    builtin!("sub", 2, 2, arith::sub),
    builtin!("mul", 2, 2, arith::mul),
    builtin!("div", 2, 2, arith::div),
    builtin!("mod", 2, 2, arith::modulus),
    builtin!("exp", 2, 2, arith::exp),
    builtin!("neg", 1, 1, arith::neg),
    builtin!("incr", 1, 1, arith::incr),
    builtin!("decr", 1, 1, arith::decr),
    builtin!("eq", 2, 2, arith::eq),
    builtin!("ne", 2, 2, arith::ne),
    builtin!("lt", 2, 2, arith::lt),
    builtin!("le", 2, 2, arith::le),
    builtin!("gt", 2, 2, arith::gt),
    builtin!("ge", 2, 2, arith::ge),
    builtin!("and", 2, 32, arith::and),
    builtin!("or", 2, 32, arith::or),
    builtin!("not", 1, 1, arith::not),
    // Strings.
    builtin!("concat", 2, 32, strings::concat),
    builtin!("strcmp", 2, 2, strings::strcmp),
    builtin!("eqstr", 2, 2, strings::eqstr),
    builtin!("strlen", 1, 1, strings::strlen),
    builtin!("substring", 3, 3, strings::substring),
    builtin!("trim", 2, 2, strings::trim),
    builtin!("rjustify", 2, 2, strings::rjustify),
    builtin!("upper", 1, 1, strings::upper),
    builtin!("lower", 1, 1, strings::lower),
    builtin!("capitalize", 1, 1, strings::capitalize),
    builtin!("d", 1, 1, strings::d),
    builtin!("strsoundex", 1, 1, strings::strsoundex),
    // Lists.
    builtin!("list", 1, 1, list::list),
    builtin!("push", 2, 2, list::push),
    builtin!("enqueue", 2, 2, list::push),
    builtin!("pop", 1, 1, list::pop),
    builtin!("requeue", 2, 2, list::requeue),
    builtin!("dequeue", 1, 1, list::dequeue),
    builtin!("getel", 2, 2, list::getel),
    builtin!("setel", 3, 3, list::setel),
    builtin!("length", 1, 1, list::length),
    builtin!("empty", 1, 1, list::empty),
    // Tables.
    builtin!("table", 1, 1, table::table),
    builtin!("insert", 3, 3, table::insert),
    builtin!("lookup", 2, 2, table::lookup),
    // Sequences.
    builtin!("indiset", 1, 1, seq::indiset),
    builtin!("addtoset", 3, 3, seq::addtoset),
    builtin!("lengthset", 1, 1, seq::lengthset),
    builtin!("inset", 2, 2, seq::inset),
    builtin!("deletefromset", 3, 3, seq::deletefromset),
    builtin!("namesort", 1, 1, seq::namesort),
    builtin!("keysort", 1, 1, seq::keysort),
    builtin!("uniqueset", 1, 1, seq::uniqueset),
    builtin!("union", 2, 2, seq::union),
    builtin!("intersect", 2, 2, seq::intersect),
    builtin!("difference", 2, 2, seq::difference),
    builtin!("parentset", 1, 1, seq::parentset),
    builtin!("childset", 1, 1, seq::childset),
    builtin!("siblingset", 1, 1, seq::siblingset),
    builtin!("spouseset", 1, 1, seq::spouseset),
    builtin!("ancestorset", 1, 1, seq::ancestorset),
    builtin!("descendantset", 1, 1, seq::descendantset),
    builtin!("descendentset", 1, 1, seq::descendantset),
    builtin!("gengedcom", 1, 1, seq::gengedcom),
    builtin!("genindiset", 2, 2, seq::genindiset),
    // Lineage accessors.
    builtin!("father", 1, 1, person::father),
    builtin!("mother", 1, 1, person::mother),
    builtin!("nextsib", 1, 1, person::nextsib),
    builtin!("prevsib", 1, 1, person::prevsib),
    builtin!("parents", 1, 1, person::parents),
    builtin!("husband", 1, 1, person::husband),
    builtin!("wife", 1, 1, person::wife),
    builtin!("firstchild", 1, 1, person::firstchild),
    builtin!("lastchild", 1, 1, person::lastchild),
    builtin!("nchildren", 1, 1, person::nchildren),
    builtin!("nfamilies", 1, 1, person::nfamilies),
    builtin!("nspouses", 1, 1, person::nspouses),
    builtin!("sex", 1, 1, person::sex),
    builtin!("name", 1, 2, person::name),
    builtin!("fullname", 4, 4, person::fullname),
    builtin!("key", 1, 2, person::key),
    builtin!("indi", 1, 1, person::indi),
    builtin!("fam", 1, 1, person::fam),
    // Record nodes and editing.
    builtin!("createnode", 1, 2, gnode::createnode),
    builtin!("tag", 1, 1, gnode::tag),
    builtin!("value", 1, 1, gnode::value),
    builtin!("root", 1, 1, gnode::root),
    builtin!("addchild", 2, 3, gnode::addchild),
    builtin!("removechild", 2, 2, gnode::removechild),
    builtin!("addspouse", 2, 2, gnode::addspouse),
    builtin!("removespouse", 2, 2, gnode::removespouse),
    // Output.
    builtin!("linemode", 0, 0, report::linemode),
    builtin!("pagemode", 2, 2, report::pagemode),
    builtin!("pageout", 0, 0, report::pageout),
    builtin!("pos", 2, 2, report::pos),
    builtin!("row", 1, 1, report::row),
    builtin!("col", 1, 1, report::col),
    builtin!("nl", 0, 0, report::nl),
    builtin!("sp", 0, 0, report::sp),
    builtin!("newfile", 1, 2, report::newfile),
    builtin!("outfile", 0, 0, report::outfile),
];

fn index() -> &'static HashMap<&'static str, &'static Builtin> {
    static INDEX: OnceLock<HashMap<&'static str, &'static Builtin>> = OnceLock::new();
    INDEX.get_or_init(|| BUILTINS.iter().map(|b| (b.name, b)).collect())
}

/// Looks a built-in up by its script-visible name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    index().get(name).copied()
}

/// Returns true if the name is a registered built-in.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    index().contains_key(name)
}
