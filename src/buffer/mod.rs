flat_mod!(flags, raw, mem);
