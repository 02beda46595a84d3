// src/emit/entry.rs
//
// Native `main` synthesis for the unit owning the managed entry point:
// collector setup, argv marshalling into a managed string array when the
// entry wants arguments, then the call with its exit code plumbed through.

use crate::resolve::{GenericContext, Resolver};
use crate::store::{MethodId, SymbolGraph};

use super::writer::CxxWriter;
use super::{is_void, method_native_name, spell_type, Spell};

pub(crate) fn write_native_entry(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    resolver: &Resolver,
    entry: MethodId,
) {
    let method = graph.method_def(entry);
    let owner = graph.type_def(method.owner);
    let signature = resolver.resolve_signature(entry, &GenericContext::empty());
    let callee = format!(
        "{}::{}",
        spell_type(graph, owner.self_ty, Spell::Bare),
        method_native_name(graph, method)
    );

    w.emit_line("auto main(int32_t argc, char* argv[]) -> int32_t");
    w.emit_line("{");
    w.indent();
    w.emit_line("atexit(__at_exit);");
    w.emit_line("GC_set_all_interior_pointers(1);");
    w.emit_line("GC_INIT();");
    let call = if signature.params.is_empty() {
        format!("{callee}()")
    } else {
        w.emit_line("auto args = __array<string*>::__new_array(argc - 1);");
        w.emit_line("for (auto i = 1; i < argc; i++)");
        w.emit_line("{");
        w.indent();
        w.emit_line("args->operator[](i - 1) = string::__from_utf8(argv[i]);");
        w.dedent();
        w.emit_line("}");
        format!("{callee}(args)")
    };
    if is_void(graph, signature.ret) {
        w.emit_line(&format!("{call};"));
        w.emit_line("return 0;");
    } else {
        w.emit_line(&format!("auto exit_code = {call};"));
        w.emit_line("return exit_code;");
    }
    w.dedent();
    w.emit_line("}");
}
