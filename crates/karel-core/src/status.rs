/// Status codes published by the interpreter and returned by the facade.
///
/// The numeric values are part of the embedding contract; hosts observe them
/// through the status channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Status {
    /// Root RETN reached; the program ran to completion.
    Success = 0,
    /// A run has started and not yet terminated.
    InProgress = 1,
    /// System failure (e.g. allocation during stack growth).
    UnknownError = 2,
    /// Facade not ready.
    NotInitialized = 3,
    /// Source file missing or unreadable.
    FileNotFound = 4,
    /// The compiler rejected the source.
    CompilationError = 5,
    /// Bytecode and/or world not loaded.
    StateNotValid = 6,
    /// The requested symbol is not in the symbol table.
    SymbolNotFound = 7,
    /// STEP into a wall or off the grid.
    StepOutOfBounds = 8,
    /// PICK_UP on a cell with zero flags.
    PickupZeroFlags = 9,
    /// PLACE on a cell already holding the maximum flag count.
    PlaceMaxFlags = 10,
    /// STOP opcode executed.
    StopEncountered = 11,
}

impl Status {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Status::Success),
            1 => Some(Status::InProgress),
            2 => Some(Status::UnknownError),
            3 => Some(Status::NotInitialized),
            4 => Some(Status::FileNotFound),
            5 => Some(Status::CompilationError),
            6 => Some(Status::StateNotValid),
            7 => Some(Status::SymbolNotFound),
            8 => Some(Status::StepOutOfBounds),
            9 => Some(Status::PickupZeroFlags),
            10 => Some(Status::PlaceMaxFlags),
            11 => Some(Status::StopEncountered),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for statuses that end a run.
    ///
    /// Configuration statuses (NOT_INITIALIZED, FILE_NOT_FOUND, ...) are
    /// reported synchronously by the facade and never published by the
    /// interpreter.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Success
                | Status::UnknownError
                | Status::StepOutOfBounds
                | Status::PickupZeroFlags
                | Status::PlaceMaxFlags
                | Status::StopEncountered
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Status::Success => "success",
            Status::InProgress => "in progress",
            Status::UnknownError => "unknown error",
            Status::NotInitialized => "not initialized",
            Status::FileNotFound => "file not found",
            Status::CompilationError => "compilation error",
            Status::StateNotValid => "bytecode and/or world not loaded",
            Status::SymbolNotFound => "symbol not found",
            Status::StepOutOfBounds => "step out of bounds",
            Status::PickupZeroFlags => "pick up on empty cell",
            Status::PlaceMaxFlags => "place on full cell",
            Status::StopEncountered => "stop encountered",
        };
        write!(f, "{}", text)
    }
}
