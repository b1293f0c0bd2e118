use std::collections::HashMap;

use lazy_static::lazy_static;

use super::descriptor::{
    ValueType, VariableDescriptor, VariableFlags, VariableOrigin, VariableShape,
};

const ALPHABET: [&str; 26] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
    "S", "T", "U", "V", "W", "X", "Y", "Z",
];

/// Every variable the runtime provides without a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableCode {
    // Integer scalars
    Day,
    Money,
    Time,
    Master,
    Target,
    Assi,
    Player,
    AssiPlay,
    SelectCom,
    PrevCom,
    NextCom,
    CharaNum,
    LineCount,
    IsTimeout,
    GameBaseVersion,
    // Integer arrays
    Flag,
    TFlag,
    Item,
    ItemSales,
    ItemPrice,
    Up,
    Down,
    LoseBase,
    Result,
    Count,
    Rand,
    Global,
    Alpha(u8),
    // String scalars and arrays
    GameBaseTitle,
    WindowTitle,
    DrawLineStr,
    MoneyLabel,
    Str,
    SaveStr,
    Results,
    TStr,
    Globals,
    ItemName,
    AblName,
    TalentName,
    // Label-local slots
    Local,
    Locals,
    Arg,
    Args,
    // Character data
    No,
    IsAssi,
    Name,
    CallName,
    NickName,
    Base,
    MaxBase,
    Abl,
    Talent,
    Exp,
    Mark,
    Palam,
    Source,
    Ex,
    NowEx,
    CFlag,
    Juel,
    GotJuel,
    Equip,
    TEquip,
    Stain,
    CStr,
    CDFlag,
    // Multi-dimensional
    DItemType,
    DA,
    DB,
    DC,
    TA,
    TB,
}

const INT: ValueType = ValueType::Integer;
const STR: ValueType = ValueType::String;

const fn builtin(shape: VariableShape, ty: ValueType, flags: VariableFlags) -> VariableDescriptor {
    VariableDescriptor::new(shape, ty, VariableOrigin::Builtin, flags)
}

const fn calculated(shape: VariableShape, ty: ValueType) -> VariableDescriptor {
    VariableDescriptor::new(
        shape,
        ty,
        VariableOrigin::Builtin,
        VariableFlags::CALCULATED.union(VariableFlags::UNCHANGEABLE),
    )
}

const fn external(shape: VariableShape, ty: ValueType, flags: VariableFlags) -> VariableDescriptor {
    VariableDescriptor::new(
        shape,
        ty,
        VariableOrigin::ExternalConstant,
        flags.union(VariableFlags::UNCHANGEABLE),
    )
}

const SAVE: VariableFlags = VariableFlags::SAVE_DATA;
const CHARA: VariableFlags = VariableFlags::CHARACTER_DATA.union(VariableFlags::SAVE_DATA);
const FORBID: VariableFlags = VariableFlags::CAN_FORBID;
const LOCAL: VariableFlags = VariableFlags::LOCAL;
const NONE: VariableFlags = VariableFlags::NONE;

use VariableShape::{Array1D, Array2D, Array3D, Scalar};

impl VariableCode {
    pub fn all() -> Vec<VariableCode> {
        use VariableCode::*;

        let mut codes = vec![
            Day, Money, Time, Master, Target, Assi, Player, AssiPlay, SelectCom, PrevCom, NextCom,
            CharaNum, LineCount, IsTimeout, GameBaseVersion, Flag, TFlag, Item, ItemSales,
            ItemPrice, Up, Down, LoseBase, Result, Count, Rand, Global, GameBaseTitle,
            WindowTitle, DrawLineStr, MoneyLabel, Str, SaveStr, Results, TStr, Globals, ItemName,
            AblName, TalentName, Local, Locals, Arg, Args, No, IsAssi, Name, CallName, NickName,
            Base, MaxBase, Abl, Talent, Exp, Mark, Palam, Source, Ex, NowEx, CFlag, Juel, GotJuel,
            Equip, TEquip, Stain, CStr, CDFlag, DItemType, DA, DB, DC, TA, TB,
        ];
        codes.extend((0..ALPHABET.len() as u8).map(Alpha));
        codes
    }

    pub fn name(&self) -> &'static str {
        use VariableCode::*;

        match self {
            Day => "DAY",
            Money => "MONEY",
            Time => "TIME",
            Master => "MASTER",
            Target => "TARGET",
            Assi => "ASSI",
            Player => "PLAYER",
            AssiPlay => "ASSIPLAY",
            SelectCom => "SELECTCOM",
            PrevCom => "PREVCOM",
            NextCom => "NEXTCOM",
            CharaNum => "CHARANUM",
            LineCount => "LINECOUNT",
            IsTimeout => "ISTIMEOUT",
            GameBaseVersion => "GAMEBASE_VERSION",
            Flag => "FLAG",
            TFlag => "TFLAG",
            Item => "ITEM",
            ItemSales => "ITEMSALES",
            ItemPrice => "ITEMPRICE",
            Up => "UP",
            Down => "DOWN",
            LoseBase => "LOSEBASE",
            Result => "RESULT",
            Count => "COUNT",
            Rand => "RAND",
            Global => "GLOBAL",
            Alpha(index) => ALPHABET[*index as usize % ALPHABET.len()],
            GameBaseTitle => "GAMEBASE_TITLE",
            WindowTitle => "WINDOW_TITLE",
            DrawLineStr => "DRAWLINESTR",
            MoneyLabel => "MONEYLABEL",
            Str => "STR",
            SaveStr => "SAVESTR",
            Results => "RESULTS",
            TStr => "TSTR",
            Globals => "GLOBALS",
            ItemName => "ITEMNAME",
            AblName => "ABLNAME",
            TalentName => "TALENTNAME",
            Local => "LOCAL",
            Locals => "LOCALS",
            Arg => "ARG",
            Args => "ARGS",
            No => "NO",
            IsAssi => "ISASSI",
            Name => "NAME",
            CallName => "CALLNAME",
            NickName => "NICKNAME",
            Base => "BASE",
            MaxBase => "MAXBASE",
            Abl => "ABL",
            Talent => "TALENT",
            Exp => "EXP",
            Mark => "MARK",
            Palam => "PALAM",
            Source => "SOURCE",
            Ex => "EX",
            NowEx => "NOWEX",
            CFlag => "CFLAG",
            Juel => "JUEL",
            GotJuel => "GOTJUEL",
            Equip => "EQUIP",
            TEquip => "TEQUIP",
            Stain => "STAIN",
            CStr => "CSTR",
            CDFlag => "CDFLAG",
            DItemType => "DITEMTYPE",
            DA => "DA",
            DB => "DB",
            DC => "DC",
            TA => "TA",
            TB => "TB",
        }
    }

    pub fn descriptor(&self) -> VariableDescriptor {
        use VariableCode::*;

        match self {
            Day | Money | Time | Master | Target | Assi | Player | AssiPlay => {
                builtin(Scalar, INT, SAVE)
            }
            SelectCom | PrevCom | NextCom => builtin(Scalar, INT, NONE),
            CharaNum | LineCount | IsTimeout => calculated(Scalar, INT),
            GameBaseVersion => external(Scalar, INT, NONE),
            Flag => builtin(Array1D, INT, SAVE),
            Item | ItemSales => builtin(Array1D, INT, SAVE.union(FORBID)),
            ItemPrice => external(Array1D, INT, FORBID),
            TFlag | Up | Down | LoseBase | Result | Count | Alpha(_) => builtin(Array1D, INT, NONE),
            Rand => calculated(Array1D, INT),
            Global => builtin(Array1D, INT, VariableFlags::GLOBAL),
            GameBaseTitle => external(Scalar, STR, NONE),
            WindowTitle => builtin(Scalar, STR, NONE),
            DrawLineStr => calculated(Scalar, STR),
            MoneyLabel => external(Scalar, STR, NONE),
            Str => builtin(Array1D, STR, FORBID),
            SaveStr => builtin(Array1D, STR, SAVE),
            Results | TStr => builtin(Array1D, STR, NONE),
            Globals => builtin(Array1D, STR, VariableFlags::GLOBAL),
            ItemName | AblName | TalentName => external(Array1D, STR, FORBID),
            Local | Arg => builtin(Array1D, INT, LOCAL),
            Locals | Args => builtin(Array1D, STR, LOCAL),
            No => builtin(Scalar, INT, CHARA.union(VariableFlags::UNCHANGEABLE)),
            IsAssi => builtin(Scalar, INT, CHARA),
            Name | CallName | NickName => builtin(Scalar, STR, CHARA),
            Base | MaxBase | Abl | Talent | Exp | Mark | Palam | Source | Ex | NowEx | CFlag
            | Juel | GotJuel | Equip | TEquip | Stain => builtin(Array1D, INT, CHARA),
            CStr => builtin(Array1D, STR, CHARA),
            CDFlag => builtin(
                Array2D,
                INT,
                VariableFlags::CHARACTER_2D_DATA.union(SAVE),
            ),
            DItemType | DA | DB | DC => builtin(Array2D, INT, NONE),
            TA | TB => builtin(Array3D, INT, NONE),
        }
    }

    /// Name of the CSV keyword table whose entries may stand in for the
    /// last index of this variable.
    pub fn constant_table(&self) -> Option<&'static str> {
        use VariableCode::*;

        match self {
            Flag => Some("FLAG"),
            TFlag => Some("TFLAG"),
            Item | ItemSales | ItemPrice | ItemName => Some("ITEM"),
            Base | MaxBase | LoseBase => Some("BASE"),
            Abl | AblName => Some("ABL"),
            Talent | TalentName => Some("TALENT"),
            Exp => Some("EXP"),
            Mark => Some("MARK"),
            Palam | Up | Down | Juel | GotJuel => Some("PALAM"),
            Source => Some("SOURCE"),
            Ex | NowEx => Some("EX"),
            CFlag => Some("CFLAG"),
            CStr => Some("CSTR"),
            Str => Some("STR"),
            Equip | TEquip => Some("EQUIP"),
            Stain => Some("STAIN"),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<VariableCode> {
        BUILTIN_VARIABLES.get(name).copied()
    }
}

lazy_static! {
    /// Builtin variable names (upper case) to their codes.
    pub static ref BUILTIN_VARIABLES: HashMap<&'static str, VariableCode> = {
        let mut map = HashMap::new();
        for code in VariableCode::all() {
            map.insert(code.name(), code);
        }
        map
    };
}
