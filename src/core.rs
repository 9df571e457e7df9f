use crate::context::Context;
use crate::evaluator::{self, Error};
use crate::printer::raw_str;
use crate::types::{truthy, Atom, Float, Function, Hash, HashKey, Int, PrimitiveFn, Value};
use itertools::Itertools;
use std::rc::Rc;

type Result = evaluator::Result;

/// `Some` only when every argument is an int; arithmetic stays integral then.
fn all_ints(args: &[Value]) -> Option<Vec<Int>> {
    args.iter().map(|arg| arg.as_int().ok()).collect()
}

fn floats(args: &[Value]) -> evaluator::Result<Vec<Float>> {
    let converted: std::result::Result<Vec<_>, _> = args.iter().map(Value::as_float).collect();
    converted.map_err(Error::from)
}

fn arithmetic(
    args: &[Value],
    int_op: fn(Int, Int) -> evaluator::Result<Int>,
    float_op: fn(Float, Float) -> Float,
) -> Result {
    if let Some(ints) = all_ints(args) {
        if let Some((&first, rest)) = ints.split_first() {
            return rest
                .iter()
                .try_fold(first, |acc, &x| int_op(acc, x))
                .map(Value::int);
        }
    }
    let floats = floats(args)?;
    match floats.split_first() {
        Some((&first, rest)) => Ok(Value::float(rest.iter().fold(first, |acc, &x| float_op(acc, x)))),
        None => Ok(Value::nil()),
    }
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    signature: "int|float,+",
    fn_ptr: |args, _ctx| arithmetic(args, |x, y| Ok(x.wrapping_add(y)), |x, y| x + y),
};

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    signature: "int|float,int|float",
    fn_ptr: |args, _ctx| arithmetic(args, |x, y| Ok(x.wrapping_sub(y)), |x, y| x - y),
};

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    signature: "int|float,+",
    fn_ptr: |args, _ctx| arithmetic(args, |x, y| Ok(x.wrapping_mul(y)), |x, y| x * y),
};

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    signature: "int|float,int|float",
    fn_ptr: div_,
};

fn div_(args: &[Value], _ctx: &Rc<Context>) -> Result {
    arithmetic(
        args,
        |x, y| match y {
            0 => Err(Error::DivideByZero),
            _ => Ok(x.wrapping_div(y)),
        },
        |x, y| x / y,
    )
}

const MOD: PrimitiveFn = PrimitiveFn {
    name: "mod",
    signature: "int,int",
    fn_ptr: |args, _ctx| {
        arithmetic(
            args,
            |x, y| match y {
                0 => Err(Error::DivideByZero),
                _ => Ok(x.wrapping_rem(y)),
            },
            |x, y| x % y,
        )
    },
};

fn comparison_(args: &[Value], comp: fn(&Float, &Float) -> bool) -> Result {
    match floats(args)?.as_slice() {
        [x, y] => Ok(Value::bool(comp(x, y))),
        _ => Ok(Value::nil()),
    }
}

macro_rules! comparison_primitive {
    ($NAME:ident, $name:literal) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: $name,
                signature: "int|float,int|float",
                fn_ptr: |args, _ctx| comparison_(args, Float:: [<$NAME:lower>]),
            };
        }
    };
}

comparison_primitive!(LT, "lt");
comparison_primitive!(LE, "lte");
comparison_primitive!(GT, "gt");
comparison_primitive!(GE, "gte");

const EQ: PrimitiveFn = PrimitiveFn {
    name: "eq",
    signature: "*,*",
    fn_ptr: |args, _ctx| Ok(Value::bool(args[0] == args[1])),
};

const NEQ: PrimitiveFn = PrimitiveFn {
    name: "neq",
    signature: "*,*",
    fn_ptr: |args, _ctx| Ok(Value::bool(args[0] != args[1])),
};

const AND: PrimitiveFn = PrimitiveFn {
    name: "and",
    signature: "bool,+",
    fn_ptr: |args, _ctx| Ok(Value::bool(args.iter().all(truthy))),
};

const OR: PrimitiveFn = PrimitiveFn {
    name: "or",
    signature: "bool,+",
    fn_ptr: |args, _ctx| Ok(Value::bool(args.iter().any(truthy))),
};

const XOR: PrimitiveFn = PrimitiveFn {
    name: "xor",
    signature: "bool,bool",
    fn_ptr: |args, _ctx| Ok(Value::bool(truthy(&args[0]) != truthy(&args[1]))),
};

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    signature: "bool",
    fn_ptr: |args, _ctx| Ok(Value::bool(!truthy(&args[0]))),
};

fn space_separated(args: &[Value]) -> String {
    args.iter().map(raw_str).join(" ")
}

// Writes straight to stdout rather than through the REPL's interface.
const PRINT: PrimitiveFn = PrimitiveFn {
    name: "print",
    signature: "**",
    fn_ptr: |args, _ctx| {
        print!("{}", space_separated(args));
        Ok(Value::nil())
    },
};

const PRINTLN: PrimitiveFn = PrimitiveFn {
    name: "println",
    signature: "**",
    fn_ptr: |args, _ctx| {
        println!("{}", space_separated(args));
        Ok(Value::nil())
    },
};

const CAT: PrimitiveFn = PrimitiveFn {
    name: "cat",
    signature: "string,+",
    fn_ptr: |args, _ctx| Ok(Value::string(args.iter().map(raw_str).join(""))),
};

const HEAD: PrimitiveFn = PrimitiveFn {
    name: "head",
    signature: "list",
    fn_ptr: |args, _ctx| {
        let list = args[0].as_list()?;
        list.first().cloned().ok_or(Error::EmptyList("head"))
    },
};

const TAIL: PrimitiveFn = PrimitiveFn {
    name: "tail",
    signature: "list",
    fn_ptr: |args, _ctx| {
        let list = args[0].as_list()?;
        Ok(Value::wrap_list(list.iter().skip(1).cloned().collect()))
    },
};

fn spread(value: &Value) -> Vec<Value> {
    match value {
        Value::List(list) => list.children.clone(),
        other => vec![other.clone()],
    }
}

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    signature: "*,*",
    fn_ptr: |args, _ctx| {
        let mut joined = spread(&args[0]);
        joined.extend(spread(&args[1]));
        Ok(Value::wrap_list(joined))
    },
};

const REV: PrimitiveFn = PrimitiveFn {
    name: "rev",
    signature: "list|string",
    fn_ptr: |args, _ctx| match &args[0] {
        Value::Atom(Atom::String(s)) => Ok(Value::string(s.chars().rev().collect::<String>())),
        other => Ok(Value::wrap_list(
            other.as_list()?.iter().rev().cloned().collect(),
        )),
    },
};

const LEN: PrimitiveFn = PrimitiveFn {
    name: "len",
    signature: "list|string|hash",
    fn_ptr: |args, _ctx| {
        let n = match &args[0] {
            Value::Atom(Atom::String(s)) => s.chars().count(),
            Value::Hash(hash) => hash.len(),
            other => other.as_list()?.len(),
        };
        Ok(Value::int(n as Int))
    },
};

const GET: PrimitiveFn = PrimitiveFn {
    name: "get",
    signature: "list,int",
    fn_ptr: get_,
};

fn get_(args: &[Value], _ctx: &Rc<Context>) -> Result {
    let list = args[0].as_list()?;
    let index = args[1].as_int()?;
    let resolved = match index {
        i if i < 0 => (list.len() as Int).checked_add(i),
        i => Some(i),
    };
    resolved
        .filter(|&i| i >= 0)
        .and_then(|i| list.get(i as usize))
        .cloned()
        .ok_or(Error::BadIndex(index))
}

fn hash_key(args: &[Value]) -> evaluator::Result<(&Rc<Hash>, HashKey)> {
    let hash = args[0].as_hash()?;
    let key = HashKey::from_value(&args[1]).ok_or(Error::BadHashKey(args[1].type_name()))?;
    Ok((hash, key))
}

const HGET: PrimitiveFn = PrimitiveFn {
    name: "hget",
    signature: "hash,string|symbol",
    fn_ptr: |args, _ctx| {
        let (hash, key) = hash_key(args)?;
        Ok(hash.get(&key).unwrap_or_else(Value::nil))
    },
};

const HSET: PrimitiveFn = PrimitiveFn {
    name: "hset!",
    signature: "hash,string|symbol,*",
    fn_ptr: |args, _ctx| {
        let (hash, key) = hash_key(args)?;
        hash.insert(key, args[2].clone());
        Ok(Value::Hash(hash.clone()))
    },
};

const HCONTAINS: PrimitiveFn = PrimitiveFn {
    name: "hcontains",
    signature: "hash,string|symbol",
    fn_ptr: |args, _ctx| {
        let (hash, key) = hash_key(args)?;
        Ok(Value::bool(hash.contains(&key)))
    },
};

const EXEC: PrimitiveFn = PrimitiveFn {
    name: "exec",
    signature: "list",
    fn_ptr: |args, ctx| {
        let code = args[0].as_list()?;
        evaluator::eval(&Value::wrap_list(code.children.clone()), ctx)
    },
};

const EVAL: PrimitiveFn = PrimitiveFn {
    name: "eval",
    signature: "string",
    fn_ptr: |args, ctx| {
        log::info!("eval from source text");
        evaluator::eval_source(args[0].as_string()?, ctx)
    },
};

const TRIM: PrimitiveFn = PrimitiveFn {
    name: "trim",
    signature: "string,string",
    fn_ptr: |args, _ctx| {
        let cutset: Vec<char> = args[1].as_string()?.chars().collect();
        let trimmed = args[0].as_string()?.trim_matches(cutset.as_slice());
        Ok(Value::string(trimmed))
    },
};

const JOIN: PrimitiveFn = PrimitiveFn {
    name: "join",
    signature: "list,string",
    fn_ptr: |args, _ctx| {
        let separator = args[1].as_string()?;
        Ok(Value::string(
            args[0].as_list()?.iter().map(raw_str).join(separator),
        ))
    },
};

fn strings(parts: impl Iterator<Item = impl Into<String>>) -> Value {
    Value::wrap_list(parts.map(Value::string).collect())
}

const SPLIT: PrimitiveFn = PrimitiveFn {
    name: "split",
    signature: "string,string",
    fn_ptr: |args, _ctx| {
        let (text, separator) = (args[0].as_string()?, args[1].as_string()?);
        Ok(strings(text.split(separator)))
    },
};

/// At most `n` pieces; a negative `n` means no limit and zero gives nothing.
const SPLIT_N: PrimitiveFn = PrimitiveFn {
    name: "split-n",
    signature: "string,string,int",
    fn_ptr: |args, _ctx| {
        let (text, separator) = (args[0].as_string()?, args[1].as_string()?);
        Ok(match args[2].as_int()? {
            n if n < 0 => strings(text.split(separator)),
            0 => Value::new_list(),
            n => strings(text.splitn(n as usize, separator)),
        })
    },
};

const PARSE_INT: PrimitiveFn = PrimitiveFn {
    name: "parse-int",
    signature: "string",
    fn_ptr: |args, _ctx| parse_int(args[0].as_string()?),
};

fn parse_int(text: &str) -> Result {
    text.trim()
        .parse::<Int>()
        .map(Value::int)
        .map_err(|_| Error::NotANumber {
            text: text.into(),
            target: "an integer",
        })
}

const PARSE_FLOAT: PrimitiveFn = PrimitiveFn {
    name: "parse-float",
    signature: "string",
    fn_ptr: |args, _ctx| parse_float(args[0].as_string()?),
};

fn parse_float(text: &str) -> Result {
    text.trim()
        .parse::<Float>()
        .map(Value::float)
        .map_err(|_| Error::NotANumber {
            text: text.into(),
            target: "a float",
        })
}

const TYPE: PrimitiveFn = PrimitiveFn {
    name: "type",
    signature: "*",
    fn_ptr: |args, _ctx| Ok(Atom::Type(args[0].type_name().into()).into()),
};

const INT: PrimitiveFn = PrimitiveFn {
    name: "int",
    signature: "int|float|string|bool",
    fn_ptr: |args, _ctx| match &args[0] {
        Value::Atom(Atom::Float(x)) => Ok(Value::int(*x as Int)),
        Value::Atom(Atom::String(s)) => parse_int(s),
        Value::Atom(Atom::Bool(b)) => Ok(Value::int(*b as Int)),
        other => Ok(other.clone()),
    },
};

const FLOAT: PrimitiveFn = PrimitiveFn {
    name: "float",
    signature: "int|float|string",
    fn_ptr: |args, _ctx| match &args[0] {
        Value::Atom(Atom::String(s)) => parse_float(s),
        other => Ok(Value::float(other.as_float()?)),
    },
};

const STRING: PrimitiveFn = PrimitiveFn {
    name: "string",
    signature: "*",
    fn_ptr: |args, _ctx| Ok(Value::string(raw_str(&args[0]))),
};

const BOOL: PrimitiveFn = PrimitiveFn {
    name: "bool",
    signature: "*",
    fn_ptr: |args, _ctx| Ok(Value::bool(truthy(&args[0]))),
};

const FLOOR: PrimitiveFn = PrimitiveFn {
    name: "floor",
    signature: "float",
    fn_ptr: |args, _ctx| Ok(Value::float(args[0].as_float()?.floor())),
};

const CEIL: PrimitiveFn = PrimitiveFn {
    name: "ceil",
    signature: "float",
    fn_ptr: |args, _ctx| Ok(Value::float(args[0].as_float()?.ceil())),
};

const ERROR: PrimitiveFn = PrimitiveFn {
    name: "error",
    signature: "string",
    fn_ptr: |args, _ctx| Err(Error::User(args[0].as_string()?.into())),
};

static CORE: &[PrimitiveFn] = &[
    // Arithmetic
    SUM,
    SUB,
    MUL,
    DIV,
    MOD,
    // Comparisons and logic
    LT,
    LE,
    GT,
    GE,
    EQ,
    NEQ,
    AND,
    OR,
    XOR,
    NOT,
    // Output
    PRINT,
    PRINTLN,
    // Working with lists
    HEAD,
    TAIL,
    CONS,
    REV,
    LEN,
    GET,
    // Working with hashes
    HGET,
    HSET,
    HCONTAINS,
    // Code as data
    EXEC,
    EVAL,
    // Working with strings
    CAT,
    TRIM,
    JOIN,
    SPLIT,
    SPLIT_N,
    PARSE_INT,
    PARSE_FLOAT,
    // Types and conversions
    TYPE,
    INT,
    FLOAT,
    STRING,
    BOOL,
    FLOOR,
    CEIL,
    ERROR,
];

/// Second names bound to the same function as the first.
const ALIASES: &[(&str, &str)] = &[
    ("add", "+"),
    ("sub", "-"),
    ("mul", "*"),
    ("div", "/"),
    ("%", "mod"),
    ("<", "lt"),
    (">", "gt"),
    ("=", "eq"),
    ("equal", "eq"),
    ("!", "not"),
    ("first", "head"),
    ("rest", "tail"),
];

pub fn install(ctx: &Rc<Context>) {
    for function in CORE {
        ctx.set_local(function.name, Value::Function(Function::Primitive(function)));
    }
    for &(alias, target) in ALIASES {
        if let Ok(value) = ctx.get(target) {
            ctx.set_local(alias, value);
        }
    }
    log::debug!("installed {} built-ins", CORE.len() + ALIASES.len());
}
