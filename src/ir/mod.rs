pub mod model;

pub use model::{
    ArchitectureBody, CompilationUnit, ConstantDecl, DeclarationBlock, EntityDocument,
    EntityModel, FunctionDecl, Generic, HdlLanguage, Instantiation, PackageDocument,
    PackageModel, Port, Process, SignalDecl, StateMachineGraph, SubprogramKind, Transition,
    TypeDecl, UnitKind, UnitName, VirtualBus,
};
